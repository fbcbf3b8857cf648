//! Structural instruction application.
//!
//! # Responsibilities
//! - Apply one version's endpoint instructions to the snapshot being derived
//! - Enforce the structural state machine: active ⇄ deleted, no double
//!   transitions, attribute changes must change something
//! - Account for every method an instruction targeted
//!
//! # Design Decisions
//! - Routes are toggled and mutated in place, never removed or reordered;
//!   physical removal happens once, at the end of generation
//! - Each instruction kind reports unmatched methods with its own message

use std::collections::HashSet;

use axum::http::Method;

use crate::error::GenerationError;
use crate::routing::locator::{find_route_indices, validate_no_duplicates, RouteQuery};
use crate::routing::route::{sorted_method_names, ApiRoute};
use crate::routing::VersionedApiRouter;
use crate::structure::{EndpointAttributes, EndpointInstruction, Version};

/// Apply every structural instruction of `version`'s changes to the router.
///
/// `never_restored` is the bookkeeping list of routes marked as existing
/// only in older versions; restoring a route consumes its entry.
pub(crate) fn apply_version_changes(
    router: &mut VersionedApiRouter,
    version: &Version,
    never_restored: &mut Vec<ApiRoute>,
) -> Result<(), GenerationError> {
    for change in &version.changes {
        for instruction in change.endpoint_instructions() {
            apply_instruction(router.routes_mut(), change.name(), instruction, never_restored)?;
        }
    }
    Ok(())
}

fn apply_instruction(
    routes: &mut [ApiRoute],
    change: &str,
    instruction: &EndpointInstruction,
    never_restored: &mut Vec<ApiRoute>,
) -> Result<(), GenerationError> {
    let target = instruction.target();
    let handler = target.handler_name.as_deref();
    let active = find_route_indices(
        routes,
        &RouteQuery::active(&target.path, &target.methods).with_handler(handler),
    );
    let mut applied: HashSet<Method> = HashSet::new();

    match instruction {
        EndpointInstruction::DidntExist(_) => {
            let deleted = find_route_indices(
                routes,
                &RouteQuery::deleted(&target.path, &target.methods).with_handler(handler),
            );
            if !deleted.is_empty() {
                let mut methods = HashSet::new();
                let mut handlers = Vec::new();
                for &index in &deleted {
                    methods.extend(routes[index].methods.iter().cloned());
                    handlers.push(routes[index].endpoint.name().to_string());
                }
                return Err(GenerationError::DoubleDeletion {
                    path: target.path.clone(),
                    methods: sorted_method_names(&methods),
                    change: change.to_string(),
                    handlers,
                });
            }
            for &index in &active {
                applied.extend(routes[index].methods.iter().cloned());
                routes[index].deleted = true;
            }
            unmatched(target, applied, |methods| GenerationError::UnmatchedDelete {
                path: target.path.clone(),
                methods,
                change: change.to_string(),
            })
        }
        EndpointInstruction::Existed(_) => {
            if !active.is_empty() {
                let mut methods = HashSet::new();
                let mut handlers = Vec::new();
                for &index in &active {
                    methods.extend(routes[index].methods.iter().cloned());
                    handlers.push(routes[index].endpoint.name().to_string());
                }
                return Err(GenerationError::AlreadyExisted {
                    path: target.path.clone(),
                    methods: sorted_method_names(&methods),
                    change: change.to_string(),
                    handlers,
                });
            }
            let deleted = find_route_indices(
                routes,
                &RouteQuery::deleted(&target.path, &target.methods).with_handler(handler),
            );
            if let Err(GenerationError::DuplicateRoute { .. }) =
                validate_no_duplicates(deleted.iter().map(|&index| &routes[index]))
            {
                let handlers = deleted
                    .iter()
                    .map(|&index| routes[index].endpoint.name().to_string())
                    .collect();
                return Err(GenerationError::AmbiguousRestore {
                    path: target.path.clone(),
                    methods: sorted_method_names(&target.methods),
                    change: change.to_string(),
                    count: deleted.len(),
                    handlers,
                });
            }
            for &index in &deleted {
                applied.extend(routes[index].methods.iter().cloned());
                routes[index].deleted = false;
                consume_never_restored(&routes[index], change, never_restored)?;
            }
            unmatched(target, applied, |methods| GenerationError::UnmatchedRestore {
                path: target.path.clone(),
                methods,
                change: change.to_string(),
            })
        }
        EndpointInstruction::Had { attributes, .. } => {
            for &index in &active {
                applied.extend(routes[index].methods.iter().cloned());
                apply_attributes(&mut routes[index], attributes, change)?;
            }
            unmatched(target, applied, |methods| GenerationError::UnmatchedChange {
                path: target.path.clone(),
                methods,
                change: change.to_string(),
            })
        }
    }
}

/// Drop the bookkeeping entry for a just-restored route. More than one
/// matching entry would make the unrestored-route check unreliable later.
fn consume_never_restored(
    restored: &ApiRoute,
    change: &str,
    never_restored: &mut Vec<ApiRoute>,
) -> Result<(), GenerationError> {
    let query = RouteQuery::deleted(&restored.path, &restored.methods)
        .with_handler(Some(restored.endpoint.name()));
    let matches = find_route_indices(never_restored, &query);
    match matches.as_slice() {
        [] => Ok(()),
        [index] => {
            never_restored.remove(*index);
            Ok(())
        }
        many => Err(GenerationError::AmbiguousNeverRestored {
            path: restored.path.clone(),
            methods: restored.method_names(),
            change: change.to_string(),
            count: many.len(),
            handlers: many
                .iter()
                .map(|&index| never_restored[index].endpoint.name().to_string())
                .collect(),
        }),
    }
}

fn unmatched(
    target: &crate::structure::EndpointTarget,
    applied: HashSet<Method>,
    build: impl FnOnce(Vec<String>) -> GenerationError,
) -> Result<(), GenerationError> {
    let missing: HashSet<Method> = target.methods.difference(&applied).cloned().collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(build(sorted_method_names(&missing)))
    }
}

fn apply_attributes(
    route: &mut ApiRoute,
    attributes: &EndpointAttributes,
    change: &str,
) -> Result<(), GenerationError> {
    fn redundant(attribute: &'static str, route: &ApiRoute, change: &str) -> GenerationError {
        GenerationError::RedundantAttribute {
            attribute,
            path: route.path.clone(),
            methods: route.method_names(),
            change: change.to_string(),
        }
    }

    if let Some(value) = &attributes.summary {
        if route.summary.as_ref() == Some(value) {
            return Err(redundant("summary", route, change));
        }
        route.summary = Some(value.clone());
    }
    if let Some(value) = &attributes.description {
        if route.description.as_ref() == Some(value) {
            return Err(redundant("description", route, change));
        }
        route.description = Some(value.clone());
    }
    if let Some(value) = attributes.status_code {
        if route.status_code == value {
            return Err(redundant("status_code", route, change));
        }
        route.status_code = value;
    }
    if let Some(value) = &attributes.tags {
        if &route.tags == value {
            return Err(redundant("tags", route, change));
        }
        route.tags = value.clone();
    }
    if let Some(value) = attributes.deprecated {
        if route.deprecated == value {
            return Err(redundant("deprecated", route, change));
        }
        route.deprecated = value;
    }
    if let Some(value) = &attributes.operation_id {
        if route.operation_id.as_ref() == Some(value) {
            return Err(redundant("operation_id", route, change));
        }
        route.operation_id = Some(value.clone());
    }
    if let Some(value) = attributes.include_in_schema {
        if route.include_in_schema == value {
            return Err(redundant("include_in_schema", route, change));
        }
        route.include_in_schema = value;
    }
    if let Some(value) = &attributes.response_model {
        if route.response_model.as_ref() == Some(value) {
            return Err(redundant("response_model", route, change));
        }
        route.response_model = Some(value.clone());
    }
    if let Some(value) = &attributes.dependencies {
        if &route.dependencies == value {
            return Err(redundant("dependencies", route, change));
        }
        route.dependencies = value.clone();
    }
    Ok(())
}
