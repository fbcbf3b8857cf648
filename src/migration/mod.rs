//! Request/response payload migration.
//!
//! # Data Flow
//! ```text
//! Request (old shape)
//!     → context.rs (ambient caller version)
//!     → chain.rs (migrations newer than caller, oldest→newest)
//!     → latest handler (runs exactly once)
//!     → chain.rs (response migrations, newest→oldest)
//! Response (old shape)
//! ```

pub mod chain;
pub mod context;
pub mod wrapper;

pub use chain::MigrationChain;
pub use context::{request_version, with_request_version};
pub(crate) use wrapper::wrap_route;
