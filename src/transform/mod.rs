//! Version generation: instruction application and orchestration.

pub mod endpoints;
pub mod generator;

pub use generator::generate_versioned_routers;
