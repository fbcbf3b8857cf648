//! The router version generator.
//!
//! # Responsibilities
//! - Walk the bundle newest→oldest, deriving one route collection per version
//! - Rewrite annotations, apply structural instructions, attach migration
//!   wrappers, strip logically deleted routes
//! - Enforce the end-of-run invariants: every older-only route restored,
//!   route order identical across snapshots
//!
//! # Design Decisions
//! - Snapshot isolation by cloning at each version boundary; clones own
//!   everything except the `Arc`-shared handler fns
//! - Wrappers are attached by route index across snapshots, with the stable
//!   route id checked at every pairing instead of trusted

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::GenerationError;
use crate::migration::{wrap_route, MigrationChain};
use crate::routing::VersionedApiRouter;
use crate::schema::{SchemaRegistry, VersionRewriter};
use crate::structure::{ApiVersion, VersionBundle};
use crate::transform::endpoints::apply_version_changes;

/// Generate one route collection per version in the bundle.
///
/// The parent router is the latest-version implementation; it is read, never
/// mutated. Each returned router is independently owned and can be
/// materialized on its own.
pub fn generate_versioned_routers(
    router: &VersionedApiRouter,
    bundle: &VersionBundle,
    registry: &SchemaRegistry,
) -> Result<BTreeMap<ApiVersion, VersionedApiRouter>, GenerationError> {
    RouterGenerator::new(router, bundle, registry).transform()
}

struct RouterGenerator<'a> {
    parent: &'a VersionedApiRouter,
    bundle: &'a VersionBundle,
    rewriter: VersionRewriter<'a>,
    /// Routes marked as existing only in older versions, pending restoration.
    never_restored: Vec<crate::routing::ApiRoute>,
}

impl<'a> RouterGenerator<'a> {
    fn new(
        parent: &'a VersionedApiRouter,
        bundle: &'a VersionBundle,
        registry: &'a SchemaRegistry,
    ) -> Self {
        let never_restored = parent
            .routes()
            .iter()
            .filter(|route| route.is_deleted())
            .cloned()
            .collect();
        Self {
            parent,
            bundle,
            rewriter: VersionRewriter::new(registry, bundle),
            never_restored,
        }
    }

    fn transform(mut self) -> Result<BTreeMap<ApiVersion, VersionedApiRouter>, GenerationError> {
        let mut snapshot = self.parent.clone();
        let mut results: BTreeMap<ApiVersion, VersionedApiRouter> = BTreeMap::new();

        for version in self.bundle.iter() {
            self.rewriter.rewrite_router(&mut snapshot, version)?;
            results.insert(version.value, snapshot.clone());
            // The next older snapshot: same routes, this version's structural
            // instructions applied.
            apply_version_changes(&mut snapshot, version, &mut self.never_restored)?;
            tracing::debug!(version = %version.value, "version snapshot derived");
        }

        if !self.never_restored.is_empty() {
            return Err(GenerationError::NeverRestored {
                handlers: self
                    .never_restored
                    .iter()
                    .map(|route| route.endpoint.name().to_string())
                    .collect(),
            });
        }

        let latest = self.bundle.latest().value;
        for (index, latest_route) in self.parent.routes().iter().enumerate() {
            let chain = Arc::new(MigrationChain::for_route(latest_route, self.bundle));
            for router in results.values_mut() {
                let route = &mut router.routes_mut()[index];
                if route.id() != latest_route.id() {
                    return Err(GenerationError::RouteOrderChanged {
                        index,
                        expected: latest_route.endpoint.name().to_string(),
                        found: route.endpoint.name().to_string(),
                    });
                }
                wrap_route(route, chain.clone(), latest)?;
            }
        }

        for router in results.values_mut() {
            router.strip_deleted();
        }
        tracing::info!(
            versions = results.len(),
            routes = self.parent.len(),
            "versioned routers generated"
        );
        Ok(results)
    }
}
