//! Test utilities and common setup.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use survey_login::api;
use survey_login::auth::{AuthConfig, AuthState, TOKEN_HEADER};
use survey_login::store::{Dataset, MemoryStore};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

/// Create a test AuthConfig with a JWT secret for testing.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Some(TEST_SECRET.to_string()),
        ..AuthConfig::default()
    }
}

pub fn test_auth_state() -> AuthState {
    AuthState::new(test_auth_config()).unwrap()
}

/// Create a test application over the given records.
pub fn test_app_with(data: Dataset) -> Router {
    let store = Arc::new(MemoryStore::new(data));
    api::create_router(api::AppState::new(test_auth_state(), store))
}

/// Create a test application over the demo records.
pub fn test_app() -> Router {
    test_app_with(Dataset::sample())
}

/// Send a request and decode the JSON response body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };

    (status, json)
}

/// POST a raw JSON body.
pub async fn post_raw(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// GET with an optional `token` header.
pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(Method::GET);
    if let Some(token) = token {
        builder = builder.header(TOKEN_HEADER, token);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

/// POST a JSON body with a `token` header.
pub async fn post_with_token(app: &Router, uri: &str, token: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method(Method::POST)
        .header(TOKEN_HEADER, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Log in by email and return the token.
pub async fn login(app: &Router, email: &str) -> String {
    let (status, json) = post_raw(app, "/login", &format!(r#"{{"email": "{email}"}}"#)).await;
    assert_eq!(status, StatusCode::OK, "login failed: {json}");
    json["token"].as_str().unwrap().to_string()
}

/// Log in and enrich the token with the respondent's units.
pub async fn login_with_units(app: &Router, email: &str) -> String {
    let token = login(app, email).await;
    let (status, json) = get(app, "/respondent_units", Some(&token)).await;
    assert_eq!(status, StatusCode::OK, "respondent_units failed: {json}");
    json["token"].as_str().unwrap().to_string()
}
