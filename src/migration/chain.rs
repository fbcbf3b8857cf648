//! Per-route migration chains.
//!
//! # Responsibilities
//! - Decide, at generation time, which of a bundle's migration instructions
//!   apply to one route
//! - Apply request migrations old→latest and response migrations latest→old
//!   in strict chronological order at call time
//!
//! # Design Decisions
//! - Matching is by logical schema name (body / response model) or by
//!   path+method; version objects never reach the transforms
//! - The chain is immutable after construction; the wrapper only reads it

use std::collections::BTreeMap;
use std::ops::Bound;

use serde_json::Value;

use crate::routing::ApiRoute;
use crate::schema::Annotation;
use crate::structure::{ApiVersion, Migration, VersionBundle};

/// The migrations registered for one route, keyed by version.
///
/// A migration at version `V` describes the payload difference introduced at
/// `V`: callers older than `V` need it applied, callers at `V` or newer do
/// not.
#[derive(Debug, Clone, Default)]
pub struct MigrationChain {
    request: BTreeMap<ApiVersion, Vec<Migration>>,
    response: BTreeMap<ApiVersion, Vec<Migration>>,
}

impl MigrationChain {
    /// Collect every migration in the bundle that applies to `route`.
    ///
    /// `route` must be the latest-version route so schema names refer to
    /// template types, the shape all migrations are written against.
    pub fn for_route(route: &ApiRoute, bundle: &VersionBundle) -> Self {
        let body_schema = route.body_schema.as_ref().and_then(Annotation::schema_name);
        let response_schema = route
            .response_model
            .as_ref()
            .and_then(Annotation::schema_name);

        let mut request: BTreeMap<ApiVersion, Vec<Migration>> = BTreeMap::new();
        let mut response: BTreeMap<ApiVersion, Vec<Migration>> = BTreeMap::new();

        for version in bundle.iter() {
            let mut request_migrations = Vec::new();
            let mut response_migrations = Vec::new();
            for change in &version.changes {
                for instruction in &change.request_by_schema {
                    if Some(instruction.schema.as_str()) == body_schema {
                        request_migrations.push(instruction.migration.clone());
                    }
                }
                for instruction in &change.request_by_path {
                    if instruction.path == route.path
                        && !instruction.methods.is_disjoint(&route.methods)
                    {
                        request_migrations.push(instruction.migration.clone());
                    }
                }
                for instruction in &change.response_by_schema {
                    if Some(instruction.schema.as_str()) == response_schema {
                        response_migrations.push(instruction.migration.clone());
                    }
                }
            }
            if !request_migrations.is_empty() {
                request.insert(version.value, request_migrations);
            }
            if !response_migrations.is_empty() {
                response.insert(version.value, response_migrations);
            }
        }
        Self { request, response }
    }

    /// Lift a request body from `caller`'s shape to latest, applying every
    /// request migration newer than `caller` in chronological order.
    pub fn migrate_request(&self, caller: ApiVersion, body: &mut Value) {
        for (version, migrations) in self
            .request
            .range((Bound::Excluded(caller), Bound::Unbounded))
        {
            for migration in migrations {
                tracing::trace!(%version, migration = migration.name(), "request migration");
                migration.apply(body);
            }
        }
    }

    /// Lower a response body from latest back to `caller`'s shape, applying
    /// every response migration newer than `caller` in reverse order.
    pub fn migrate_response(&self, caller: ApiVersion, body: &mut Value) {
        for (version, migrations) in self
            .response
            .range((Bound::Excluded(caller), Bound::Unbounded))
            .rev()
        {
            for migration in migrations {
                tracing::trace!(%version, migration = migration.name(), "response migration");
                migration.apply(body);
            }
        }
    }

    /// Whether any migration applies to the route at all.
    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty()
    }
}
