//! The route model.
//!
//! # Responsibilities
//! - Carry everything the generator rewrites: endpoint descriptor, response
//!   model, dependencies, body schema, attributes, nested callbacks
//! - Provide the deleted-route marker used for restoration bookkeeping
//! - Re-derive wiring (body schema, hidden context params) after a rewrite
//!
//! # Design Decisions
//! - `Clone` is the per-version deep copy; handler functions are shared
//!   immutable `Arc`s, everything else is owned
//! - Every route gets a stable id at registration; instruction application
//!   must never reorder routes, and the generator checks ids to prove it

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::{Method, StatusCode};

use crate::routing::handler::{HandlerError, HandlerFn, HandlerRequest};
use crate::schema::{Annotation, CallableSpec, Dependency, Param, ParamKind};

/// Name of the hidden request-context parameter injected by the generator.
pub(crate) const REQUEST_CONTEXT_PARAM: &str = "__request_context__";
/// Name of the hidden response-context parameter injected by the generator.
pub(crate) const RESPONSE_CONTEXT_PARAM: &str = "__response_context__";

/// Stable logical identity of a route, assigned at registration.
///
/// Identical across all per-version copies of the same logical endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteId(pub(crate) u64);

/// A handler paired with its introspectable descriptor.
#[derive(Clone)]
pub struct Endpoint {
    spec: Arc<CallableSpec>,
    handler: HandlerFn,
}

impl Endpoint {
    /// Pair a descriptor with its async implementation.
    pub fn new<F, Fut>(spec: CallableSpec, handler: F) -> Self
    where
        F: Fn(HandlerRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, HandlerError>> + Send + 'static,
    {
        Self {
            spec: Arc::new(spec),
            handler: Arc::new(move |request| Box::pin(handler(request))),
        }
    }

    pub(crate) fn from_parts(spec: Arc<CallableSpec>, handler: HandlerFn) -> Self {
        Self { spec, handler }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &CallableSpec {
        &self.spec
    }

    pub(crate) fn set_spec(&mut self, spec: CallableSpec) {
        self.spec = Arc::new(spec);
    }

    pub(crate) fn handler(&self) -> HandlerFn {
        self.handler.clone()
    }

    pub(crate) fn set_handler(&mut self, handler: HandlerFn) {
        self.handler = handler;
    }

    /// Invoke the handler.
    pub fn call(&self, request: HandlerRequest) -> crate::routing::handler::HandlerFuture {
        (self.handler)(request)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.spec.name)
            .field("is_async", &self.spec.is_async)
            .finish()
    }
}

/// One registered route: path, methods, endpoint, schemas and attributes.
#[derive(Debug, Clone)]
pub struct ApiRoute {
    pub(crate) id: RouteId,
    pub path: String,
    pub methods: HashSet<Method>,
    pub endpoint: Endpoint,
    pub dependencies: Vec<Dependency>,
    /// Schema of the request body, derived from the endpoint's body param.
    pub body_schema: Option<Annotation>,
    pub response_model: Option<Annotation>,
    pub status_code: StatusCode,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub operation_id: Option<String>,
    pub include_in_schema: bool,
    /// Nested callback routes; rewritten with the parent, never dispatched.
    pub callbacks: Vec<ApiRoute>,
    /// Logically absent in the snapshot currently being built.
    pub(crate) deleted: bool,
}

impl ApiRoute {
    /// A route with default attributes. The id is assigned at registration.
    pub fn new(
        path: impl Into<String>,
        methods: impl IntoIterator<Item = Method>,
        endpoint: Endpoint,
    ) -> Self {
        let mut route = Self {
            id: RouteId(u64::MAX),
            path: path.into(),
            methods: methods.into_iter().collect(),
            endpoint,
            dependencies: Vec::new(),
            body_schema: None,
            response_model: None,
            status_code: StatusCode::OK,
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            operation_id: None,
            include_in_schema: true,
            callbacks: Vec::new(),
            deleted: false,
        };
        route.refresh_wiring();
        route
    }

    pub fn response_model(mut self, annotation: Annotation) -> Self {
        self.response_model = Some(annotation);
        self
    }

    pub fn status_code(mut self, status: StatusCode) -> Self {
        self.status_code = status;
        self
    }

    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.summary = Some(text.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn callback(mut self, route: ApiRoute) -> Self {
        self.callbacks.push(route);
        self
    }

    /// Stable logical identity across per-version copies.
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Whether the route is logically absent in the current snapshot.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Re-derive wiring from the endpoint descriptor: body schema from the
    /// body parameter, and the hidden context parameters every versioned
    /// endpoint must carry.
    pub(crate) fn refresh_wiring(&mut self) {
        self.body_schema = self
            .endpoint
            .spec()
            .params
            .iter()
            .find(|p| p.kind == ParamKind::Body)
            .map(|p| p.annotation.clone());
        self.ensure_context_params();
    }

    fn ensure_context_params(&mut self) {
        let spec = self.endpoint.spec();
        let missing_request = spec.find_param(REQUEST_CONTEXT_PARAM).is_none();
        let missing_response = spec.find_param(RESPONSE_CONTEXT_PARAM).is_none();
        if !missing_request && !missing_response {
            return;
        }
        let mut spec = spec.clone();
        if missing_request {
            spec.params.push(Param::new(
                REQUEST_CONTEXT_PARAM,
                ParamKind::Context,
                Annotation::Opaque("Request".to_string()),
            ));
        }
        if missing_response {
            spec.params.push(Param::new(
                RESPONSE_CONTEXT_PARAM,
                ParamKind::Context,
                Annotation::Opaque("Response".to_string()),
            ));
        }
        self.endpoint.set_spec(spec);
    }

    /// Methods as sorted strings, for error messages and logs.
    pub(crate) fn method_names(&self) -> Vec<String> {
        sorted_method_names(&self.methods)
    }
}

/// Sorted method names for deterministic error messages.
pub(crate) fn sorted_method_names(methods: &HashSet<Method>) -> Vec<String> {
    let mut names: Vec<String> = methods.iter().map(|m| m.to_string()).collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn probe_endpoint() -> Endpoint {
        Endpoint::new(
            CallableSpec::async_fn("probe")
                .param(Param::body("payload", Annotation::schema("ProbeRequest"))),
            |_req| async { Ok(json!({"ok": true})) },
        )
    }

    #[test]
    fn test_body_schema_derived_from_endpoint() {
        let route = ApiRoute::new("/probes", [Method::POST], probe_endpoint());
        assert_eq!(
            route.body_schema.as_ref().and_then(|a| a.schema_name()),
            Some("ProbeRequest")
        );
    }

    #[test]
    fn test_context_params_injected_once() {
        let route = ApiRoute::new("/probes", [Method::POST], probe_endpoint());
        let spec = route.endpoint.spec();
        assert!(spec.find_param(REQUEST_CONTEXT_PARAM).is_some());
        assert!(spec.find_param(RESPONSE_CONTEXT_PARAM).is_some());

        let mut route = route;
        let before = route.endpoint.spec().params.len();
        route.refresh_wiring();
        assert_eq!(route.endpoint.spec().params.len(), before);
    }

    #[test]
    fn test_clone_shares_handler() {
        let route = ApiRoute::new("/probes", [Method::POST], probe_endpoint());
        let copy = route.clone();
        assert!(Arc::ptr_eq(&route.endpoint.handler(), &copy.endpoint.handler()));
        assert_eq!(copy.path, "/probes");
    }

    #[tokio::test]
    async fn test_endpoint_call() {
        let endpoint = probe_endpoint();
        let value = endpoint
            .call(HandlerRequest::with_body(json!({})))
            .await
            .unwrap();
        assert_eq!(value, json!({"ok": true}));
    }
}
