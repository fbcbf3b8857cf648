//! Shared fixtures for integration tests.

use std::fs;
use std::path::PathBuf;
use std::sync::Once;

use axum::http::Method;
use serde_json::json;
use timegate::routing::{ApiRoute, Endpoint, HandlerError, VersionedApiRouter};
use timegate::schema::{Annotation, CallableSpec, Param, SchemaRegistry};
use timegate::structure::{
    ApiVersion, EndpointInstruction, EndpointTarget, Migration, RequestBySchema, ResponseBySchema,
    Version, VersionBundle, VersionChange,
};

static TRACING: Once = Once::new();

/// Initialize the tracing subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "timegate=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .init();
    });
}

pub fn v2000() -> ApiVersion {
    ApiVersion::new(2000, 1, 1)
}

pub fn v2001() -> ApiVersion {
    ApiVersion::new(2001, 1, 1)
}

/// Create an on-disk schema tree (`latest/` plus one dir per version) and a
/// registry declaring the user schemas in the template directory.
pub fn user_schema_registry(versions: &[ApiVersion]) -> (PathBuf, SchemaRegistry) {
    init_tracing();
    let root = std::env::temp_dir()
        .join("timegate-integration-tests")
        .join(uuid::Uuid::new_v4().to_string());
    fs::create_dir_all(root.join("latest")).unwrap();
    for version in versions {
        fs::create_dir_all(root.join(version.dir_name())).unwrap();
    }
    let mut registry = SchemaRegistry::new(root.join("latest")).unwrap();
    registry.declare_template_model("UserCreateRequest");
    registry.declare_template_model("UserResource");
    (root, registry)
}

/// The latest-version users API: list, create, fetch.
///
/// Latest shape carries `addresses: [..]`; the 2001 version change migrates
/// older callers' single `address` field in both directions.
pub fn users_router() -> VersionedApiRouter {
    let mut router = VersionedApiRouter::new();
    router.route(
        ApiRoute::new(
            "/users",
            [Method::GET],
            Endpoint::new(CallableSpec::async_fn("list_users"), |_| async {
                Ok(json!([{"id": 1, "name": "ada", "addresses": ["home"]}]))
            }),
        )
        .response_model(Annotation::list(Annotation::schema("UserResource"))),
    );
    router.route(
        ApiRoute::new(
            "/users",
            [Method::POST],
            Endpoint::new(
                CallableSpec::async_fn("create_user")
                    .param(Param::body("payload", Annotation::schema("UserCreateRequest"))),
                |request| async move {
                    let mut body = request.body.ok_or_else(|| HandlerError::bad_request("body required"))?;
                    body["id"] = json!(1);
                    Ok(body)
                },
            ),
        )
        .response_model(Annotation::schema("UserResource"))
        .status_code(axum::http::StatusCode::CREATED),
    );
    router.route(
        ApiRoute::new(
            "/users/{id}",
            [Method::GET],
            Endpoint::new(
                CallableSpec::async_fn("get_user")
                    .param(Param::path("id", Annotation::Opaque("u64".to_string()))),
                |request| async move {
                    match request.path_param("id") {
                        Some("1") => Ok(json!({"id": 1, "name": "ada", "addresses": ["home"]})),
                        _ => Err(HandlerError::not_found("user not found")),
                    }
                },
            ),
        )
        .response_model(Annotation::schema("UserResource")),
    );
    router
}

/// The 2001 change: `address` became a list named `addresses`.
pub fn address_split_change() -> VersionChange {
    VersionChange::builder("address_became_a_list")
        .description("User addresses became a list of strings")
        .migrate_request_by_schema(RequestBySchema {
            schema: "UserCreateRequest".to_string(),
            migration: Migration::new("wrap_address", |body| {
                let address = body["address"].take();
                body["addresses"] = json!([address]);
                if let Some(map) = body.as_object_mut() {
                    map.remove("address");
                }
            }),
        })
        .migrate_response_by_schema(ResponseBySchema {
            schema: "UserResource".to_string(),
            migration: Migration::new("unwrap_address", |body| {
                let first = body["addresses"][0].take();
                body["address"] = first;
                if let Some(map) = body.as_object_mut() {
                    map.remove("addresses");
                }
            }),
        })
        .build()
}

/// The 2001 change that introduced `GET /users`.
pub fn listing_added_change() -> VersionChange {
    VersionChange::builder("users_listing_added")
        .endpoint(EndpointInstruction::DidntExist(EndpointTarget::new(
            "/users",
            [Method::GET],
        )))
        .build()
}

/// Two-version bundle: 2001 (latest, with the given changes) and 2000.
pub fn two_version_bundle(changes: Vec<VersionChange>) -> VersionBundle {
    VersionBundle::new(vec![
        Version::with_changes(v2001(), changes),
        Version::unchanged(v2000()),
    ])
    .unwrap()
}
