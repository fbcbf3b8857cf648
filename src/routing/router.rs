//! The registration router.
//!
//! # Responsibilities
//! - Collect routes at latest-version authoring time
//! - Assign each route its stable id
//! - Mark handlers that only exist in older versions
//!
//! # Design Decisions
//! - `Clone` produces the per-version snapshot the generator mutates
//! - Marking uses the deleted tag, not removal, so the route stays in place
//!   for restoration while older versions are derived

use crate::error::MarkerError;
use crate::routing::route::{ApiRoute, RouteId};

/// An ordered collection of routes, registered against the latest version.
#[derive(Debug, Clone, Default)]
pub struct VersionedApiRouter {
    routes: Vec<ApiRoute>,
    next_id: u64,
}

impl VersionedApiRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Registration order is preserved across generation.
    pub fn route(&mut self, mut route: ApiRoute) -> &mut Self {
        route.id = RouteId(self.next_id);
        self.next_id += 1;
        tracing::trace!(path = %route.path, handler = route.endpoint.name(), "route registered");
        self.routes.push(route);
        self
    }

    /// Mark the route owned by `handler_name` as existing only in older
    /// versions. The route must later be restored by some version change.
    pub fn only_exists_in_older_versions(&mut self, handler_name: &str) -> Result<(), MarkerError> {
        let route = self
            .routes
            .iter_mut()
            .find(|route| route.endpoint.name() == handler_name)
            .ok_or_else(|| MarkerError::RouteNotFound {
                handler: handler_name.to_string(),
            })?;
        if route.deleted {
            return Err(MarkerError::AlreadyMarked {
                handler: handler_name.to_string(),
            });
        }
        route.deleted = true;
        Ok(())
    }

    pub fn routes(&self) -> &[ApiRoute] {
        &self.routes
    }

    pub(crate) fn routes_mut(&mut self) -> &mut Vec<ApiRoute> {
        &mut self.routes
    }

    /// Drop all routes still carrying the deleted marker.
    pub(crate) fn strip_deleted(&mut self) {
        self.routes.retain(|route| !route.deleted);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
