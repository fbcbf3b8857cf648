//! Declarative description of an API's history.
//!
//! # Responsibilities
//! - Version tags and the ordered version bundle
//! - Version changes: structural endpoint instructions plus payload
//!   migrations, grouped per version boundary
//!
//! # Design Decisions
//! - Instructions are plain data; applying them is the transform module's job
//! - Migrations are opaque named closures over parsed JSON bodies

pub mod changes;
pub mod data;
pub mod endpoints;
pub mod versions;

pub use changes::{VersionChange, VersionChangeBuilder};
pub use data::{Migration, RequestByPath, RequestBySchema, ResponseBySchema};
pub use endpoints::{EndpointAttributes, EndpointInstruction, EndpointTarget};
pub use versions::{ApiVersion, Version, VersionBundle};
