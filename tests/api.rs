// tests/api.rs

// Declare the common module
mod common;

use axum::{
    body::Body,
    http::{self, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use melodyhub_server::auth::TokenSigner;
use melodyhub_server::models::UploadTicketDto;

use common::helpers::{create_test_app, TEST_TOKEN_SECRET};

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[tokio::test]
async fn root_responds() {
    let app = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_route_rejects_missing_token() {
    let app = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_rejects_malformed_token() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/me")
                .header(http::header::AUTHORIZATION, bearer("not-a-token"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_route_rejects_token_from_wrong_secret() {
    let app = create_test_app();
    let foreign = TokenSigner::new("some-entirely-different-secret!!");
    let token = foreign.issue("alice");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/me")
                .header(http::header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_rejects_expired_token() {
    let app = create_test_app();
    let signer = TokenSigner::new(TEST_TOKEN_SECRET);
    let token = signer.issue_with_ttl("alice", -30);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/me")
                .header(http::header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejects_invalid_email() {
    let app = create_test_app();

    let payload = json!({
        "email": "not-an-email",
        "login": "newmusician",
        "firstName": "Anna",
        "lastName": "Schmidt",
        "password": "Str0ngPass!"
    });
    let response = app
        .oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri("/auth/register")
                .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_weak_password() {
    let app = create_test_app();

    let payload = json!({
        "email": "anna@example.com",
        "login": "newmusician",
        "firstName": "Anna",
        "lastName": "Schmidt",
        "password": "weak"
    });
    let response = app
        .oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri("/auth/register")
                .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_listing_rejects_bad_category_filter() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/posts?categoryIds=1,abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_ticket_is_issued_for_valid_token() {
    let app = create_test_app();
    let signer = TokenSigner::new(TEST_TOKEN_SECRET);
    let token = signer.issue("alice");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/uploads/video?filename=riff.mov")
                .header(http::header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let ticket: UploadTicketDto =
        serde_json::from_slice(&body).expect("Failed to deserialize upload ticket");

    assert!(ticket.key.ends_with("-riff.mov"));
    assert!(ticket.upload_url.starts_with("https://media.test/videos/"));
    assert!(ticket.upload_url.contains("signature="));
}

#[tokio::test]
async fn upload_ticket_rejects_filename_with_path_separator() {
    let app = create_test_app();
    let signer = TokenSigner::new(TEST_TOKEN_SECRET);
    let token = signer.issue("alice");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/uploads/image?filename=..%2Fescape.jpg")
                .header(http::header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
