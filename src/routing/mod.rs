//! Route model and registration.
//!
//! # Data Flow
//! ```text
//! Latest-version authoring
//!     → route.rs (ApiRoute + endpoint descriptors)
//!     → router.rs (VersionedApiRouter registration, older-only marker)
//!     → locator.rs (lookup used by instruction application)
//! ```
//!
//! # Design Decisions
//! - Routes keep registration order; generation never reorders them
//! - Logical deletion via a marker, physical removal only at the very end
//! - Handlers are `Arc`-shared across per-version copies

pub mod handler;
pub mod locator;
pub mod route;
pub mod router;

pub use handler::{HandlerError, HandlerFn, HandlerFuture, HandlerRequest, RequestParts};
pub use locator::{find_route_indices, validate_no_duplicates, RouteQuery};
pub use route::{ApiRoute, Endpoint, RouteId};
pub use router::VersionedApiRouter;
