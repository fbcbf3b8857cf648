//! The annotation version rewriter.
//!
//! # Responsibilities
//! - Recursively walk annotation trees and repoint every versioned schema
//!   reference at a target version's variant
//! - Rewrite whole routes: response model, dependencies, endpoint descriptor,
//!   nested callback routes
//! - Enforce the template-directory rule when resolving to latest
//!
//! # Design Decisions
//! - Resolution goes through the explicit registry; unknown names are not
//!   versioned and pass through untouched
//! - Rewritten type references are interned per (name, target version) so
//!   two occurrences of the same original type stay pointer-identical; the
//!   cache lives on the rewriter and dies with the generation run
//! - Rewriting is idempotent: repointing an already-pinned reference walks
//!   the same lookup path and lands on the same interned value

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::GenerationError;
use crate::routing::{ApiRoute, VersionedApiRouter};
use crate::schema::annotation::{
    Annotation, CallableSpec, Dependency, Param, ParamDefault, SchemaVersion, TypeRef,
};
use crate::schema::registry::SchemaRegistry;
use crate::structure::{Version, VersionBundle};

/// Rewrites route annotations to a target version's schema variants.
///
/// One rewriter serves one generation run; its intern cache must not outlive
/// the run.
pub struct VersionRewriter<'a> {
    registry: &'a SchemaRegistry,
    /// Template directory plus one directory per declared version.
    version_dirs: Vec<PathBuf>,
    cache: HashMap<(String, SchemaVersion), Arc<TypeRef>>,
}

impl<'a> VersionRewriter<'a> {
    pub fn new(registry: &'a SchemaRegistry, bundle: &VersionBundle) -> Self {
        let mut version_dirs = vec![registry.template_dir().to_path_buf()];
        version_dirs.extend(bundle.iter().map(|v| registry.version_dir(v.value)));
        Self {
            registry,
            version_dirs,
            cache: HashMap::new(),
        }
    }

    /// Rewrite every route in the router to `version`'s schema variants.
    ///
    /// Fails if the version's schema directory is missing on disk.
    pub fn rewrite_router(
        &mut self,
        router: &mut VersionedApiRouter,
        version: &Version,
    ) -> Result<(), GenerationError> {
        let dir = self.registry.version_dir(version.value);
        if !dir.is_dir() {
            return Err(GenerationError::MissingVersionDirectory { dir });
        }
        tracing::debug!(version = %version.value, routes = router.routes().len(), "rewriting router annotations");
        for route in router.routes_mut() {
            self.rewrite_route(route, SchemaVersion::Pinned(version.value))?;
        }
        Ok(())
    }

    /// Rewrite one route's annotations, then refresh its derived wiring.
    pub fn rewrite_route(
        &mut self,
        route: &mut ApiRoute,
        target: SchemaVersion,
    ) -> Result<(), GenerationError> {
        if let Some(model) = route.response_model.take() {
            route.response_model = Some(self.rewrite(&model, target)?);
        }
        let mut dependencies = Vec::with_capacity(route.dependencies.len());
        for dependency in &route.dependencies {
            dependencies.push(self.rewrite_dependency(dependency, target)?);
        }
        route.dependencies = dependencies;

        let spec = self.rewrite_callable(route.endpoint.spec(), target)?;
        route.endpoint.set_spec(spec);

        for callback in &mut route.callbacks {
            self.rewrite_route(callback, target)?;
        }
        route.refresh_wiring();
        Ok(())
    }

    /// Recursively rewrite one annotation.
    pub fn rewrite(
        &mut self,
        annotation: &Annotation,
        target: SchemaVersion,
    ) -> Result<Annotation, GenerationError> {
        match annotation {
            Annotation::Map(entries) => {
                let mut rewritten = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    rewritten.push((self.rewrite(key, target)?, self.rewrite(value, target)?));
                }
                Ok(Annotation::Map(rewritten))
            }
            Annotation::Sequence(items) => {
                Ok(Annotation::Sequence(self.rewrite_all(items, target)?))
            }
            Annotation::Tuple(items) => Ok(Annotation::Tuple(self.rewrite_all(items, target)?)),
            Annotation::Generic { name, args } => Ok(Annotation::Generic {
                name: name.clone(),
                args: self.rewrite_all(args, target)?,
            }),
            Annotation::Dependency(dependency) => Ok(Annotation::Dependency(
                self.rewrite_dependency(dependency, target)?,
            )),
            Annotation::Union(members) => Ok(Annotation::Union(self.rewrite_all(members, target)?)),
            Annotation::Any | Annotation::Opaque(_) | Annotation::Value(_) => Ok(annotation.clone()),
            Annotation::Type(type_ref) => self.rewrite_type(type_ref, target),
            Annotation::Callable(spec) => Ok(Annotation::Callable(Arc::new(
                self.rewrite_callable(spec, target)?,
            ))),
        }
    }

    fn rewrite_all(
        &mut self,
        items: &[Annotation],
        target: SchemaVersion,
    ) -> Result<Vec<Annotation>, GenerationError> {
        let mut rewritten = Vec::with_capacity(items.len());
        for item in items {
            rewritten.push(self.rewrite(item, target)?);
        }
        Ok(rewritten)
    }

    fn rewrite_type(
        &mut self,
        type_ref: &Arc<TypeRef>,
        target: SchemaVersion,
    ) -> Result<Annotation, GenerationError> {
        let registry = self.registry;
        let Some(decl) = registry.lookup(&type_ref.name) else {
            // Not a versioned type; hand it back untouched.
            return Ok(Annotation::Type(type_ref.clone()));
        };
        if target == SchemaVersion::Template {
            let in_version_tree = decl.source.starts_with(registry.root())
                && self.version_dirs.iter().any(|d| decl.source.starts_with(d));
            if in_version_tree && !decl.source.starts_with(registry.template_dir()) {
                return Err(GenerationError::TypeNotInTemplate {
                    name: decl.name.clone(),
                    template: registry.template_dir().to_path_buf(),
                    found: decl.source.clone(),
                });
            }
        }
        let kind = decl.kind;
        let resolved = self
            .cache
            .entry((type_ref.name.clone(), target))
            .or_insert_with(|| {
                Arc::new(TypeRef {
                    name: type_ref.name.clone(),
                    kind,
                    version: target,
                })
            })
            .clone();
        Ok(Annotation::Type(resolved))
    }

    fn rewrite_dependency(
        &mut self,
        dependency: &Dependency,
        target: SchemaVersion,
    ) -> Result<Dependency, GenerationError> {
        Ok(Dependency {
            callable: Arc::new(self.rewrite_callable(&dependency.callable, target)?),
            use_cache: dependency.use_cache,
        })
    }

    /// Rebuild a callable descriptor with every parameter annotation and
    /// default rewritten. Names, kinds and parameter order are preserved.
    fn rewrite_callable(
        &mut self,
        spec: &CallableSpec,
        target: SchemaVersion,
    ) -> Result<CallableSpec, GenerationError> {
        let mut params = Vec::with_capacity(spec.params.len());
        for param in &spec.params {
            let default = match &param.default {
                None => None,
                Some(ParamDefault::Value(value)) => Some(ParamDefault::Value(value.clone())),
                Some(ParamDefault::Dependency(dependency)) => Some(ParamDefault::Dependency(
                    self.rewrite_dependency(dependency, target)?,
                )),
            };
            params.push(Param {
                name: param.name.clone(),
                kind: param.kind,
                annotation: self.rewrite(&param.annotation, target)?,
                default,
            });
        }
        let returns = match &spec.returns {
            Some(annotation) => Some(self.rewrite(annotation, target)?),
            None => None,
        };
        Ok(CallableSpec {
            name: spec.name.clone(),
            is_async: spec.is_async,
            params,
            returns,
        })
    }
}
