//! End-to-end generation tests over the users API.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;
use timegate::error::GenerationError;
use timegate::migration::with_request_version;
use timegate::routing::HandlerRequest;
use timegate::schema::Annotation;
use timegate::structure::{
    ApiVersion, EndpointAttributes, EndpointInstruction, EndpointTarget, Version, VersionBundle,
    VersionChange,
};
use timegate::transform::generate_versioned_routers;

mod common;
use common::{
    address_split_change, listing_added_change, two_version_bundle, user_schema_registry,
    users_router, v2000, v2001,
};

#[test]
fn test_endpoint_added_at_newer_version_is_absent_in_older() {
    let (_root, registry) = user_schema_registry(&[v2000(), v2001()]);
    let bundle = two_version_bundle(vec![listing_added_change()]);

    let routers = generate_versioned_routers(&users_router(), &bundle, &registry).unwrap();

    let has_listing = |version: ApiVersion| {
        routers[&version]
            .routes()
            .iter()
            .any(|route| route.endpoint.name() == "list_users")
    };
    assert!(has_listing(v2001()));
    assert!(!has_listing(v2000()));
    // Unrelated routes survive in both versions.
    assert_eq!(routers[&v2001()].len(), 3);
    assert_eq!(routers[&v2000()].len(), 2);
}

#[test]
fn test_restored_route_keeps_pre_deletion_attributes() {
    let (_root, registry) = user_schema_registry(&[v2000(), v2001()]);
    let mut router = users_router();
    router.only_exists_in_older_versions("list_users").unwrap();
    let change = VersionChange::builder("listing_removed")
        .endpoint(EndpointInstruction::Existed(EndpointTarget::new(
            "/users",
            [Method::GET],
        )))
        .build();
    let bundle = two_version_bundle(vec![change]);

    let routers = generate_versioned_routers(&router, &bundle, &registry).unwrap();

    assert!(!routers[&v2001()]
        .routes()
        .iter()
        .any(|route| route.endpoint.name() == "list_users"));
    let restored = routers[&v2000()]
        .routes()
        .iter()
        .find(|route| route.endpoint.name() == "list_users")
        .expect("restored route");
    assert_eq!(restored.path, "/users");
    assert!(restored.methods.contains(&Method::GET));
    assert_eq!(restored.status_code, StatusCode::OK);
    assert!(restored.response_model.is_some());
}

#[test]
fn test_redundant_status_change_fails_generation() {
    let (_root, registry) = user_schema_registry(&[v2000(), v2001()]);
    let change = VersionChange::builder("redundant_create_status")
        .endpoint(EndpointInstruction::Had {
            target: EndpointTarget::new("/users", [Method::POST]),
            attributes: EndpointAttributes::new().status_code(StatusCode::CREATED),
        })
        .build();
    let bundle = two_version_bundle(vec![change]);

    let err = generate_versioned_routers(&users_router(), &bundle, &registry).unwrap_err();
    assert!(matches!(
        err,
        GenerationError::RedundantAttribute { attribute: "status_code", .. }
    ));
}

#[test]
fn test_double_delete_in_one_change_names_route_and_change() {
    let (_root, registry) = user_schema_registry(&[v2000(), v2001()]);
    let change = VersionChange::builder("double_delete")
        .endpoint(EndpointInstruction::DidntExist(EndpointTarget::new(
            "/users",
            [Method::GET],
        )))
        .endpoint(EndpointInstruction::DidntExist(EndpointTarget::new(
            "/users",
            [Method::GET],
        )))
        .build();
    let bundle = two_version_bundle(vec![change]);

    let err = generate_versioned_routers(&users_router(), &bundle, &registry).unwrap_err();
    match err {
        GenerationError::DoubleDeletion { change, handlers, path, .. } => {
            assert_eq!(change, "double_delete");
            assert_eq!(path, "/users");
            assert_eq!(handlers, vec!["list_users".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_attribute_change_applies_only_to_older_versions() {
    let (_root, registry) = user_schema_registry(&[v2000(), v2001()]);
    let change = VersionChange::builder("create_used_to_return_200")
        .endpoint(EndpointInstruction::Had {
            target: EndpointTarget::new("/users", [Method::POST]),
            attributes: EndpointAttributes::new().status_code(StatusCode::OK),
        })
        .build();
    let bundle = two_version_bundle(vec![change]);

    let routers = generate_versioned_routers(&users_router(), &bundle, &registry).unwrap();
    let status_of = |version: ApiVersion| {
        routers[&version]
            .routes()
            .iter()
            .find(|route| route.endpoint.name() == "create_user")
            .unwrap()
            .status_code
    };
    assert_eq!(status_of(v2001()), StatusCode::CREATED);
    assert_eq!(status_of(v2000()), StatusCode::OK);
}

#[test]
fn test_same_schema_shares_one_rewritten_type_per_version() {
    let (_root, registry) = user_schema_registry(&[v2000(), v2001()]);
    let bundle = two_version_bundle(vec![]);

    let routers = generate_versioned_routers(&users_router(), &bundle, &registry).unwrap();
    for router in routers.values() {
        // "UserResource" appears in the listing's Vec<..> and as the create
        // route's bare response model; both must be the same object.
        let in_listing = match &router.routes()[0].response_model {
            Some(Annotation::Generic { args, .. }) => match &args[0] {
                Annotation::Type(type_ref) => type_ref.clone(),
                other => panic!("expected type ref, got {other:?}"),
            },
            other => panic!("expected generic response model, got {other:?}"),
        };
        let in_create = match &router.routes()[1].response_model {
            Some(Annotation::Type(type_ref)) => type_ref.clone(),
            other => panic!("expected type response model, got {other:?}"),
        };
        assert!(Arc::ptr_eq(&in_listing, &in_create));
    }
}

#[tokio::test]
async fn test_round_trip_without_migrations_is_a_no_op() {
    let (_root, registry) = user_schema_registry(&[v2000(), v2001()]);
    let bundle = two_version_bundle(vec![]);

    let routers = generate_versioned_routers(&users_router(), &bundle, &registry).unwrap();
    let create = routers[&v2000()]
        .routes()
        .iter()
        .find(|route| route.endpoint.name() == "create_user")
        .unwrap();

    let request = HandlerRequest::with_body(json!({"name": "ada", "addresses": ["home"]}))
        .with_parts(timegate::routing::RequestParts {
            method: Method::POST,
            path: "/users".to_string(),
            headers: axum::http::HeaderMap::new(),
        });
    let response = with_request_version(v2000(), create.endpoint.call(request))
        .await
        .unwrap();
    assert_eq!(response, json!({"id": 1, "name": "ada", "addresses": ["home"]}));
}

#[tokio::test]
async fn test_old_caller_bodies_migrate_up_and_down() {
    let (_root, registry) = user_schema_registry(&[v2000(), v2001()]);
    let bundle = two_version_bundle(vec![address_split_change()]);

    let routers = generate_versioned_routers(&users_router(), &bundle, &registry).unwrap();
    let create = routers[&v2000()]
        .routes()
        .iter()
        .find(|route| route.endpoint.name() == "create_user")
        .unwrap();

    let request = HandlerRequest::with_body(json!({"name": "ada", "address": "home"})).with_parts(
        timegate::routing::RequestParts {
            method: Method::POST,
            path: "/users".to_string(),
            headers: axum::http::HeaderMap::new(),
        },
    );
    let response = with_request_version(v2000(), create.endpoint.call(request))
        .await
        .unwrap();
    // Handler ran against the latest shape; the caller sees the 2000 shape.
    assert_eq!(response, json!({"id": 1, "name": "ada", "address": "home"}));
}

#[test]
fn test_generated_routers_are_independent() {
    let (_root, registry) = user_schema_registry(&[v2000(), v2001()]);
    let bundle = two_version_bundle(vec![listing_added_change()]);

    let router = users_router();
    let routers = generate_versioned_routers(&router, &bundle, &registry).unwrap();
    // The parent router is untouched by generation.
    assert_eq!(router.len(), 3);
    assert!(router.routes().iter().all(|route| !route.is_deleted()));
    // Version results are disjoint copies.
    let bundle2 = VersionBundle::new(vec![Version::unchanged(v2001())]).unwrap();
    let again = generate_versioned_routers(&router, &bundle2, &registry).unwrap();
    assert_eq!(again[&v2001()].len(), 3);
    assert_eq!(routers[&v2000()].len(), 2);
}
