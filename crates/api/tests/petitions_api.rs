//! HTTP-level integration tests for `/api/petitions` and `/api/sign`.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router,
//! backed by the in-memory petition store.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, build_test_app, build_test_app_with, get, post_json, send};
use serde_json::{json, Value};
use wishwall_core::gateway::MemoryPetitionGateway;
use wishwall_core::moderation::BLOCKED_CONTENT_MESSAGE;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_petition(id: &str, title: &str, created_at: i64) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "希望能再办一次巡演",
        "imageUrl": "data:image/png;base64,aGVsbG8=",
        "author": "popcorn",
        "createdAt": created_at,
    })
}

fn new_signature(id: &str, first_name: &str, timestamp: i64) -> Value {
    json!({
        "id": id,
        "firstName": first_name,
        "lastName": "Lee",
        "email": format!("{first_name}@example.com"),
        "timestamp": timestamp,
    })
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_is_empty_initially() {
    let response = get(build_test_app(), "/api/petitions").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json, json!({ "petitions": [] }));
}

#[tokio::test]
async fn created_petitions_are_listed_newest_first() {
    let app = build_test_app();

    for (id, title, at) in [("p-1", "巡演请愿", 1_000), ("p-2", "新专辑请愿", 2_000)] {
        let response = post_json(app.clone(), "/api/petitions", new_petition(id, title, at)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "success": true }));
    }

    let json = body_json(get(app, "/api/petitions").await).await;
    let petitions = json["petitions"].as_array().unwrap();
    assert_eq!(petitions.len(), 2);
    assert_eq!(petitions[0]["id"], "p-2");
    assert_eq!(petitions[1]["title"], "巡演请愿");
    assert_eq!(petitions[1]["imageUrl"], "data:image/png;base64,aGVsbG8=");
    assert_eq!(petitions[1]["createdAt"], 1_000);
    assert_eq!(petitions[1]["signatures"], json!([]));
}

// ---------------------------------------------------------------------------
// Creation checks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blank_author_becomes_anonymous() {
    let app = build_test_app();
    let mut body = new_petition("p-1", "巡演请愿", 1_000);
    body["author"] = json!("");
    body["imageUrl"] = json!(null);

    post_json(app.clone(), "/api/petitions", body).await;

    let json = body_json(get(app, "/api/petitions").await).await;
    assert_eq!(json["petitions"][0]["author"], "匿名爆米花");
    assert_eq!(json["petitions"][0]["imageUrl"], Value::Null);
}

#[tokio::test]
async fn blocked_content_is_rejected_and_not_stored() {
    let store = Arc::new(MemoryPetitionGateway::new());
    let app = build_test_app_with(store.clone(), None);

    let response = post_json(app, "/api/petitions", new_petition("p-1", "单飞请愿", 1_000)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], BLOCKED_CONTENT_MESSAGE);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn missing_title_is_rejected() {
    let mut body = new_petition("p-1", "", 1_000);
    body["title"] = json!("   ");

    let response = post_json(build_test_app(), "/api/petitions", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn duplicate_id_is_reported_with_its_code() {
    let app = build_test_app();
    post_json(app.clone(), "/api/petitions", new_petition("p-1", "巡演请愿", 1_000)).await;

    let response = post_json(app, "/api/petitions", new_petition("p-1", "新专辑请愿", 2_000)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["code"], "DUPLICATE_ID");
}

#[tokio::test]
async fn created_at_out_of_range_is_rejected() {
    let store = Arc::new(MemoryPetitionGateway::new());

    for created_at in [-1, i64::MAX] {
        let app = build_test_app_with(store.clone(), None);
        let response =
            post_json(app, "/api/petitions", new_petition("p-1", "巡演请愿", created_at)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"], "createdAt is out of range");
    }
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn malformed_body_gets_json_error_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/petitions")
        .header("content-type", "application/json")
        .body(Body::from("{\"id\": \"p-1\", \"title\": "))
        .unwrap();

    let response = send(build_test_app(), request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn wrong_field_type_gets_json_error_envelope() {
    let mut body = new_petition("p-1", "巡演请愿", 1_000);
    body["createdAt"] = json!("yesterday");

    let response = post_json(build_test_app(), "/api/petitions", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signatures_are_appended_in_order() {
    let app = build_test_app();
    post_json(app.clone(), "/api/petitions", new_petition("p-1", "巡演请愿", 1_000)).await;

    for (n, name) in ["ada", "grace", "linus"].iter().enumerate() {
        let response = post_json(
            app.clone(),
            "/api/sign",
            json!({
                "petitionId": "p-1",
                "signature": new_signature(&format!("s-{n}"), name, 2_000 + n as i64),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let json = body_json(get(app, "/api/petitions").await).await;
    let names: Vec<_> = json["petitions"][0]["signatures"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["firstName"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["ada", "grace", "linus"]);
}

#[tokio::test]
async fn signing_unknown_petition_is_reported_with_its_code() {
    let response = post_json(
        build_test_app(),
        "/api/sign",
        json!({ "petitionId": "nope", "signature": new_signature("s-1", "ada", 1) }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["code"], "UNKNOWN_PETITION");
}

#[tokio::test]
async fn signature_without_email_is_rejected() {
    let app = build_test_app();
    post_json(app.clone(), "/api/petitions", new_petition("p-1", "巡演请愿", 1_000)).await;
    let mut signature = new_signature("s-1", "ada", 1);
    signature["email"] = json!("");

    let response = post_json(
        app,
        "/api/sign",
        json!({ "petitionId": "p-1", "signature": signature }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signature_timestamp_out_of_range_is_rejected() {
    let app = build_test_app();
    post_json(app.clone(), "/api/petitions", new_petition("p-1", "巡演请愿", 1_000)).await;

    let response = post_json(
        app.clone(),
        "/api/sign",
        json!({ "petitionId": "p-1", "signature": new_signature("s-1", "ada", i64::MAX) }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "timestamp is out of range");
    let json = body_json(get(app, "/api/petitions").await).await;
    assert_eq!(json["petitions"][0]["signatures"], json!([]));
}

#[tokio::test]
async fn get_on_sign_is_method_not_allowed() {
    let response = get(build_test_app(), "/api/sign").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await["code"], "METHOD_NOT_ALLOWED");
}
