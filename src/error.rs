//! Error definitions for version generation.
//!
//! Every failure during router generation is a fatal configuration error:
//! the author has to fix the version bundle or the schema layout, there is
//! nothing to retry. No partial router is ever returned.

use std::path::PathBuf;

use thiserror::Error;

use crate::structure::ApiVersion;

/// Errors raised while generating versioned routers.
///
/// All variants surface synchronously from [`generate_versioned_routers`]
/// before the service starts serving traffic.
///
/// [`generate_versioned_routers`]: crate::transform::generate_versioned_routers
#[derive(Debug, Error)]
pub enum GenerationError {
    /// An endpoint was deleted by two different version changes.
    #[error(
        "endpoint \"{methods:?} {path}\" deleted in \"{change}\" was already deleted in a newer \
         version; if two routes share a path and methods, set `handler_name` to tell them apart \
         (handlers already deleted: {handlers:?})"
    )]
    DoubleDeletion {
        path: String,
        methods: Vec<String>,
        change: String,
        handlers: Vec<String>,
    },

    /// An endpoint was restored even though it still exists in a newer version.
    #[error(
        "endpoint \"{methods:?} {path}\" restored in \"{change}\" already exists in a newer \
         version; if two routes share a path and methods, set `handler_name` to tell them apart \
         (handlers that already exist: {handlers:?})"
    )]
    AlreadyExisted {
        path: String,
        methods: Vec<String>,
        change: String,
        handlers: Vec<String>,
    },

    /// A restore instruction matched more than one deleted route.
    #[error(
        "endpoint \"{methods:?} {path}\" restored in \"{change}\" has {count} candidate routes; \
         set `handler_name` to pick one (candidate handlers: {handlers:?})"
    )]
    AmbiguousRestore {
        path: String,
        methods: Vec<String>,
        change: String,
        count: usize,
        handlers: Vec<String>,
    },

    /// Restoring a route matched more than one "older versions only" bookkeeping
    /// entry, so an unrestored route could no longer be reported reliably.
    #[error(
        "endpoint \"{methods:?} {path}\" restored in \"{change}\" matches {count} routes marked \
         as existing only in older versions; give their handlers distinct names: {handlers:?}"
    )]
    AmbiguousNeverRestored {
        path: String,
        methods: Vec<String>,
        change: String,
        count: usize,
        handlers: Vec<String>,
    },

    /// An attribute change instruction that does not change anything.
    #[error(
        "attribute \"{attribute}\" of endpoint \"{methods:?} {path}\" was expected to differ in \
         \"{change}\" but it is already equal to the requested value; the instruction has no \
         effect and can be removed"
    )]
    RedundantAttribute {
        attribute: &'static str,
        path: String,
        methods: Vec<String>,
        change: String,
    },

    /// A delete instruction targeted methods that no route carries.
    #[error("endpoint \"{methods:?} {path}\" deleted in \"{change}\" doesn't exist in a newer version")]
    UnmatchedDelete {
        path: String,
        methods: Vec<String>,
        change: String,
    },

    /// A restore instruction targeted methods no deleted route carries.
    #[error("endpoint \"{methods:?} {path}\" restored in \"{change}\" wasn't among the deleted routes")]
    UnmatchedRestore {
        path: String,
        methods: Vec<String>,
        change: String,
    },

    /// An attribute change instruction targeted methods no route carries.
    #[error("endpoint \"{methods:?} {path}\" changed in \"{change}\" doesn't exist")]
    UnmatchedChange {
        path: String,
        methods: Vec<String>,
        change: String,
    },

    /// Two routes share an identical path and method set.
    #[error(
        "route \"{methods:?} {path}\" is registered twice (handlers \"{first}\" and \"{second}\")"
    )]
    DuplicateRoute {
        path: String,
        methods: Vec<String>,
        first: String,
        second: String,
    },

    /// The schema template path is not a directory.
    #[error("the schema template path \"{path}\" is not a directory")]
    TemplateNotADirectory { path: PathBuf },

    /// The schema template directory has the wrong name.
    #[error("the schema template directory must be named \"latest\", got \"{name}\"")]
    TemplateNotNamedLatest { name: String },

    /// A declared version has no schema directory on disk.
    #[error("versioned schema directory \"{dir}\" does not exist")]
    MissingVersionDirectory { dir: PathBuf },

    /// A versioned endpoint handler is not asynchronous.
    #[error("all versioned endpoints must be asynchronous; handler \"{handler}\" is not")]
    EndpointNotAsync { handler: String },

    /// A schema type used where the template (latest) variant was required is
    /// declared inside a version directory instead of the template directory.
    #[error(
        "type \"{name}\" is declared in \"{found}\" but must be declared in the template \
         directory \"{template}\"; a version-pinned type was used where \"latest\" was required"
    )]
    TypeNotInTemplate {
        name: String,
        template: PathBuf,
        found: PathBuf,
    },

    /// Routes marked as existing only in older versions that no version change
    /// ever restored.
    #[error(
        "every route marked as existing only in older versions must be restored by some older \
         version change, otherwise delete it altogether; never restored: {handlers:?}"
    )]
    NeverRestored { handlers: Vec<String> },

    /// Route order diverged between version snapshots.
    ///
    /// Instruction application never reorders routes, so identical indices must
    /// hold the same logical route in every snapshot.
    #[error(
        "route order changed during generation: index {index} holds \"{found}\" but the latest \
         router holds \"{expected}\" there"
    )]
    RouteOrderChanged {
        index: usize,
        expected: String,
        found: String,
    },

    /// The version bundle is not ordered newest-first.
    #[error("version bundle must be ordered newest-first: {earlier} appears before {later}")]
    VersionsNotDescending {
        earlier: ApiVersion,
        later: ApiVersion,
    },

    /// The version bundle contains no versions.
    #[error("version bundle must declare at least one version")]
    EmptyBundle,
}

/// Errors raised by [`only_exists_in_older_versions`], independent of the
/// generation pass.
///
/// [`only_exists_in_older_versions`]: crate::routing::VersionedApiRouter::only_exists_in_older_versions
#[derive(Debug, Error)]
pub enum MarkerError {
    /// No registered route has a handler with the given name.
    #[error("no route found for handler \"{handler}\"; is it registered on this router?")]
    RouteNotFound { handler: String },

    /// The handler was already marked as deleted.
    #[error("the route for handler \"{handler}\" is already marked; it can't be marked again")]
    AlreadyMarked { handler: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display() {
        let err = GenerationError::MissingVersionDirectory {
            dir: PathBuf::from("/schemas/v2021_01_01"),
        };
        assert!(err.to_string().contains("v2021_01_01"));

        let err = GenerationError::EndpointNotAsync {
            handler: "get_users".to_string(),
        };
        assert!(err.to_string().contains("get_users"));
    }

    #[test]
    fn test_marker_error_display() {
        let err = MarkerError::AlreadyMarked {
            handler: "get_user".to_string(),
        };
        assert!(err.to_string().contains("already marked"));
    }
}
