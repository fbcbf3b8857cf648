//! Versioned schema machinery: annotation tree, type registry, rewriter.

pub mod annotation;
pub mod registry;
pub mod rewriter;

pub use annotation::{
    Annotation, CallableSpec, Dependency, Param, ParamDefault, ParamKind, SchemaVersion, TypeKind,
    TypeRef,
};
pub use registry::{SchemaRegistry, TypeDecl};
pub use rewriter::VersionRewriter;
