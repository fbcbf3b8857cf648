//! Handler invocation types.
//!
//! Handlers are boxed async functions over a framework-neutral request view.
//! The gateway builds a [`HandlerRequest`] from the raw axum request; the
//! migration wrapper rewrites its body before the latest handler runs.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};
use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

/// Raw request information injected alongside the parsed body.
///
/// This is the hidden request/response context every versioned endpoint gets:
/// the generator guarantees a context parameter exists on the endpoint
/// descriptor, and the dispatch layer always fills this slot.
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

/// The framework-neutral view of one request, handed to handlers.
#[derive(Debug, Clone, Default)]
pub struct HandlerRequest {
    /// Parsed JSON body, if the request carried one.
    pub body: Option<Value>,
    /// Captured path parameters.
    pub path_params: HashMap<String, String>,
    /// Query string parameters.
    pub query: HashMap<String, String>,
    /// Hidden request context. `None` only if the dispatch layer is broken.
    pub parts: Option<Arc<RequestParts>>,
}

impl HandlerRequest {
    /// A request carrying only a JSON body; used heavily in tests.
    pub fn with_body(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    /// Attach the hidden request context.
    pub fn with_parts(mut self, parts: RequestParts) -> Self {
        self.parts = Some(Arc::new(parts));
        self
    }

    /// One captured path parameter.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}

/// Errors a handler can surface to the client.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An error with an explicit HTTP status.
    #[error("{detail}")]
    Status { status: StatusCode, detail: String },

    /// An internal invariant was violated; maps to 500 and is logged.
    ///
    /// Distinct from configuration errors: those surface during generation,
    /// never at request time.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::Status {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::Status {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Status { status, .. } => *status,
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Future returned by a handler: the response body value.
pub type HandlerFuture = BoxFuture<'static, Result<Value, HandlerError>>;

/// A boxed async handler function.
pub type HandlerFn = Arc<dyn Fn(HandlerRequest) -> HandlerFuture + Send + Sync>;
