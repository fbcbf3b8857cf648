//! timegate — date-versioned API router generation for axum.
//!
//! You maintain one latest implementation of your routes plus a chronological
//! list of declarative version changes; timegate derives a complete,
//! independently routable API surface for every historical version.
//!
//! # Architecture Overview
//!
//! ```text
//!   Latest routes              Version bundle            Schema registry
//!   (VersionedApiRouter)       (structure)               (schema)
//!         │                         │                         │
//!         └──────────┬──────────────┴───────────┬─────────────┘
//!                    ▼                          ▼
//!          ┌──────────────────┐      ┌────────────────────┐
//!          │    transform     │─────▶│  schema::rewriter  │
//!          │  (generator +    │      │ (annotations → one │
//!          │   instructions)  │      │  version's types)  │
//!          └────────┬─────────┘      └────────────────────┘
//!                   │ one router per version,
//!                   │ handlers wrapped with migrations
//!                   ▼
//!          ┌──────────────────┐      ┌────────────────────┐
//!          │    migration     │      │      gateway       │
//!          │ (per-request     │◀─────│ (header dispatch,  │
//!          │  body up/down)   │      │  axum serving)     │
//!          └──────────────────┘      └────────────────────┘
//! ```
//!
//! Generation runs once at startup and fails fast on any configuration
//! error; request-time work is limited to pure body transforms around the
//! one latest handler.
//!
//! # Example
//!
//! ```no_run
//! use axum::http::Method;
//! use serde_json::json;
//! use timegate::routing::{ApiRoute, Endpoint, VersionedApiRouter};
//! use timegate::schema::{Annotation, CallableSpec, Param, SchemaRegistry};
//! use timegate::structure::{ApiVersion, Version, VersionBundle};
//! use timegate::transform::generate_versioned_routers;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = VersionedApiRouter::new();
//! router.route(
//!     ApiRoute::new(
//!         "/users",
//!         [Method::POST],
//!         Endpoint::new(
//!             CallableSpec::async_fn("create_user")
//!                 .param(Param::body("payload", Annotation::schema("UserCreateRequest"))),
//!             |request| async move { Ok(request.body.unwrap_or(json!(null))) },
//!         ),
//!     )
//!     .response_model(Annotation::schema("UserResource")),
//! );
//!
//! let mut registry = SchemaRegistry::new("schemas/latest")?;
//! registry.declare_template_model("UserCreateRequest");
//! registry.declare_template_model("UserResource");
//!
//! let bundle = VersionBundle::new(vec![
//!     Version::unchanged(ApiVersion::new(2021, 1, 1)),
//!     Version::unchanged(ApiVersion::new(2000, 1, 1)),
//! ])?;
//!
//! let routers = generate_versioned_routers(&router, &bundle, &registry)?;
//! assert_eq!(routers.len(), 2);
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod error;
pub mod routing;
pub mod schema;
pub mod structure;
pub mod transform;

// Request-time machinery
pub mod migration;

// Serving layer
pub mod gateway;

pub use error::{GenerationError, MarkerError};
pub use gateway::{GatewayConfig, VersionGateway};
pub use routing::VersionedApiRouter;
pub use structure::{ApiVersion, VersionBundle};
pub use transform::generate_versioned_routers;
