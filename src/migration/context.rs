//! Ambient request version context.
//!
//! The gateway resolves the caller's API version once per request and scopes
//! it over the whole dispatch future; the migration wrapper reads it back
//! when choosing which migrations to run. Task-local, so concurrent requests
//! never observe each other's version.

use std::future::Future;

use crate::structure::ApiVersion;

tokio::task_local! {
    static REQUEST_VERSION: ApiVersion;
}

/// Run `fut` with the ambient request version set to `version`.
pub async fn with_request_version<F: Future>(version: ApiVersion, fut: F) -> F::Output {
    REQUEST_VERSION.scope(version, fut).await
}

/// The ambient request version, if one is in scope.
pub fn request_version() -> Option<ApiVersion> {
    REQUEST_VERSION.try_with(|version| *version).ok()
}
