//! Route lookup.
//!
//! # Responsibilities
//! - Find routes by path, method subset, handler name and deleted state
//! - Detect routes that are exact duplicates of each other
//!
//! # Design Decisions
//! - Queries return indices so callers can mutate matched routes in place
//! - A route matches when its method set is a subset of the query's; callers
//!   decide whether multiple matches are an error

use std::collections::HashSet;

use axum::http::Method;

use crate::error::GenerationError;
use crate::routing::route::{sorted_method_names, ApiRoute};

/// Criteria for locating routes in a collection.
#[derive(Debug, Clone)]
pub struct RouteQuery<'a> {
    pub path: &'a str,
    pub methods: &'a HashSet<Method>,
    pub handler_name: Option<&'a str>,
    /// Match routes whose deleted-marker state equals this.
    pub deleted: bool,
}

impl<'a> RouteQuery<'a> {
    pub fn active(path: &'a str, methods: &'a HashSet<Method>) -> Self {
        Self {
            path,
            methods,
            handler_name: None,
            deleted: false,
        }
    }

    pub fn deleted(path: &'a str, methods: &'a HashSet<Method>) -> Self {
        Self {
            path,
            methods,
            handler_name: None,
            deleted: true,
        }
    }

    pub fn with_handler(mut self, name: Option<&'a str>) -> Self {
        self.handler_name = name;
        self
    }

    fn matches(&self, route: &ApiRoute) -> bool {
        route.path == self.path
            && route.methods.is_subset(self.methods)
            && route.is_deleted() == self.deleted
            && self
                .handler_name
                .map(|name| route.endpoint.name() == name)
                .unwrap_or(true)
    }
}

/// Indices of all routes matching the query, in registration order.
pub fn find_route_indices(routes: &[ApiRoute], query: &RouteQuery<'_>) -> Vec<usize> {
    routes
        .iter()
        .enumerate()
        .filter(|(_, route)| query.matches(route))
        .map(|(index, _)| index)
        .collect()
}

/// Error if any two of the given routes share an identical (path, method set).
pub fn validate_no_duplicates<'r>(
    routes: impl IntoIterator<Item = &'r ApiRoute>,
) -> Result<(), GenerationError> {
    let mut seen: Vec<&ApiRoute> = Vec::new();
    for route in routes {
        if let Some(existing) = seen
            .iter()
            .find(|r| r.path == route.path && r.methods == route.methods)
        {
            return Err(GenerationError::DuplicateRoute {
                path: route.path.clone(),
                methods: sorted_method_names(&route.methods),
                first: existing.endpoint.name().to_string(),
                second: route.endpoint.name().to_string(),
            });
        }
        seen.push(route);
    }
    Ok(())
}
