//! Serving generated version routers.
//!
//! # Responsibilities
//! - Materialize each generated route collection into an axum `Router`
//! - Resolve the caller's API version from the version header and forward
//!   the request to that version's router under the ambient version context
//! - Wire up middleware (timeout, request id, tracing) and metrics
//!
//! # Design Decisions
//! - Version resolution waterfalls: the newest version not newer than the
//!   requested date wins; a missing header means latest
//! - A requested date older than the oldest version is a client error, not a
//!   silent fallback

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{RawPathParams, Request};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::MethodFilter;
use axum::{Json, Router};
use metrics::{counter, histogram};
use serde_json::json;
use tokio::net::TcpListener;
use tower::util::ServiceExt;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::gateway::config::{ConfigError, GatewayConfig, ValidationError};
use crate::migration::with_request_version;
use crate::routing::{HandlerError, HandlerFn, HandlerRequest, RequestParts, VersionedApiRouter};
use crate::structure::ApiVersion;

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        if let HandlerError::Internal(detail) = &self {
            tracing::error!(detail = %detail, "internal handler error");
        }
        let status = self.status();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Everything dispatch needs about one route, shared with its axum handlers.
struct CompiledRoute {
    handler: HandlerFn,
    handler_name: String,
    status_code: StatusCode,
    max_body_bytes: usize,
}

/// Serves one axum router per generated API version.
#[derive(Debug)]
pub struct VersionGateway {
    versions: BTreeMap<ApiVersion, Router>,
    header: HeaderName,
    latest: ApiVersion,
    timeout: Duration,
}

impl VersionGateway {
    /// Build a gateway over generated routers.
    pub fn new(
        routers: BTreeMap<ApiVersion, VersionedApiRouter>,
        config: &GatewayConfig,
    ) -> Result<Self, ConfigError> {
        let latest = match routers.keys().next_back() {
            Some(version) => *version,
            None => return Err(ConfigError::Validation(vec![ValidationError::NoVersions])),
        };
        let header = HeaderName::try_from(config.version_header.as_str()).map_err(|_| {
            ConfigError::Validation(vec![ValidationError::InvalidVersionHeader(
                config.version_header.clone(),
            )])
        })?;
        let mut versions = BTreeMap::new();
        for (version, router) in &routers {
            versions.insert(*version, materialize(router, config.max_body_bytes)?);
        }
        Ok(Self {
            versions,
            header,
            latest,
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// The newest version the gateway serves.
    pub fn latest(&self) -> ApiVersion {
        self.latest
    }

    /// Turn the gateway into a single axum router with middleware applied.
    pub fn into_router(self) -> Router {
        let timeout = self.timeout;
        let gateway = Arc::new(self);
        Router::new()
            .fallback(move |request: Request| {
                let gateway = gateway.clone();
                async move { gateway.dispatch(request).await }
            })
            .layer(TimeoutLayer::new(timeout))
            .layer(axum::middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the gateway, accepting connections on the given listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            versions = self.versions.len(),
            latest = %self.latest,
            "version gateway starting"
        );
        let app = self.into_router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("version gateway stopped");
        Ok(())
    }

    async fn dispatch(&self, request: Request) -> Response {
        let start = Instant::now();
        let requested = match request.headers().get(&self.header) {
            None => self.latest,
            Some(value) => match value.to_str().ok().and_then(ApiVersion::parse) {
                Some(version) => version,
                None => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "detail": format!("invalid {} header; expected YYYY-MM-DD", self.header)
                        })),
                    )
                        .into_response();
                }
            },
        };
        // Waterfall to the newest version that is not newer than the request.
        let Some((version, router)) = self.versions.range(..=requested).next_back() else {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "detail": format!("no API version available as old as {requested}")
                })),
            )
                .into_response();
        };

        tracing::debug!(requested = %requested, resolved = %version, path = request.uri().path(), "dispatching");
        let service = router.clone();
        let mut response = with_request_version(*version, async move {
            match service.oneshot(request).await {
                Ok(response) => response,
                Err(infallible) => match infallible {},
            }
        })
        .await;

        counter!("gateway_requests_total", "version" => version.to_string()).increment(1);
        histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());

        if let Ok(value) = HeaderValue::from_str(&version.to_string()) {
            response.headers_mut().insert(self.header.clone(), value);
        }
        response
    }
}

/// Build the axum router for one version's route collection.
fn materialize(router: &VersionedApiRouter, max_body_bytes: usize) -> Result<Router, ConfigError> {
    let mut axum_router = Router::new();
    for route in router.routes() {
        let compiled = Arc::new(CompiledRoute {
            handler: route.endpoint.handler(),
            handler_name: route.endpoint.name().to_string(),
            status_code: route.status_code,
            max_body_bytes,
        });
        let mut method_router = axum::routing::MethodRouter::new();
        for method in &route.methods {
            let filter = MethodFilter::try_from(method.clone()).map_err(|_| {
                ConfigError::Validation(vec![ValidationError::UnsupportedMethod {
                    method: method.to_string(),
                    path: route.path.clone(),
                }])
            })?;
            let compiled = compiled.clone();
            method_router = method_router.on(filter, move |params: RawPathParams, request: Request| {
                let compiled = compiled.clone();
                async move { dispatch_route(compiled, params, request).await }
            });
        }
        axum_router = axum_router.route(&route.path, method_router);
    }
    Ok(axum_router)
}

/// Translate the raw axum request into a handler request and run the route.
async fn dispatch_route(
    compiled: Arc<CompiledRoute>,
    params: RawPathParams,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let path_params: HashMap<String, String> = params
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    let query: HashMap<String, String> = parts
        .uri
        .query()
        .map(|raw| {
            url::form_urlencoded::parse(raw.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    let bytes = match axum::body::to_bytes(body, compiled.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({"detail": "request body too large"})),
            )
                .into_response();
        }
    };
    let body_value = if bytes.is_empty() {
        None
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(error) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"detail": format!("invalid JSON body: {error}")})),
                )
                    .into_response();
            }
        }
    };

    let handler_request = HandlerRequest {
        body: body_value,
        path_params,
        query,
        parts: Some(Arc::new(RequestParts {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            headers: parts.headers.clone(),
        })),
    };

    match (compiled.handler)(handler_request).await {
        Ok(value) => (compiled.status_code, Json(value)).into_response(),
        Err(error) => {
            tracing::debug!(handler = %compiled.handler_name, status = %error.status(), "handler error");
            error.into_response()
        }
    }
}

/// Ensure every request carries an id for log correlation.
async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    if !request.headers().contains_key("x-request-id") {
        let id = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&id) {
            request.headers_mut().insert("x-request-id", value);
        }
    }
    next.run(request).await
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_requires_at_least_one_version() {
        let err = VersionGateway::new(BTreeMap::new(), &GatewayConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_gateway_rejects_invalid_header_name() {
        let mut routers = BTreeMap::new();
        routers.insert(ApiVersion::new(2021, 1, 1), VersionedApiRouter::new());
        let config = GatewayConfig {
            version_header: "bad header\n".to_string(),
            ..GatewayConfig::default()
        };
        let err = VersionGateway::new(routers, &config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_latest_is_newest_generated_version() {
        let mut routers = BTreeMap::new();
        routers.insert(ApiVersion::new(2000, 1, 1), VersionedApiRouter::new());
        routers.insert(ApiVersion::new(2021, 1, 1), VersionedApiRouter::new());
        let gateway = VersionGateway::new(routers, &GatewayConfig::default()).unwrap();
        assert_eq!(gateway.latest(), ApiVersion::new(2021, 1, 1));
    }
}
