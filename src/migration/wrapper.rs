//! The request/response migration wrapper.
//!
//! Wraps a route's handler so that, per call: the incoming body is lifted
//! from the caller's version to latest, the latest handler runs exactly
//! once, and the returned body is lowered back down. Migration steps are
//! synchronous pure transforms; the only suspension point is the wrapped
//! handler itself.

use std::sync::Arc;

use crate::error::GenerationError;
use crate::migration::chain::MigrationChain;
use crate::migration::context::request_version;
use crate::routing::{ApiRoute, HandlerError, HandlerFn};
use crate::structure::ApiVersion;

/// Replace `route`'s handler with a version-migrating wrapper.
///
/// `latest` is the newest version in the bundle; callers without an ambient
/// version are treated as latest and skip every migration. Fails if the
/// endpoint is not asynchronous: versioned endpoints must never block the
/// dispatch task.
pub(crate) fn wrap_route(
    route: &mut ApiRoute,
    chain: Arc<MigrationChain>,
    latest: ApiVersion,
) -> Result<(), GenerationError> {
    if !route.endpoint.spec().is_async {
        return Err(GenerationError::EndpointNotAsync {
            handler: route.endpoint.name().to_string(),
        });
    }
    // The hidden context params are (re)injected here so the invariant holds
    // even for routes whose wiring was never refreshed after registration.
    route.refresh_wiring();

    let inner = route.endpoint.handler();
    let handler_name: Arc<str> = Arc::from(route.endpoint.name());
    let wrapped: HandlerFn = Arc::new(move |mut request| {
        let chain = chain.clone();
        let inner = inner.clone();
        let handler_name = handler_name.clone();
        Box::pin(async move {
            if request.parts.is_none() {
                // Generation guarantees the context slot; reaching this means
                // the dispatch layer itself is broken, not the author's setup.
                return Err(HandlerError::internal(format!(
                    "request context missing for handler \"{handler_name}\""
                )));
            }
            let caller = request_version().unwrap_or(latest);
            if let Some(body) = request.body.as_mut() {
                chain.migrate_request(caller, body);
            }
            let mut value = inner(request).await?;
            chain.migrate_response(caller, &mut value);
            Ok(value)
        })
    });
    route.endpoint.set_handler(wrapped);
    Ok(())
}
