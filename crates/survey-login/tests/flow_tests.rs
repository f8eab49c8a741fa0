//! End-to-end session walks over a test server.

use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{Value, json};
use survey_login::auth::TOKEN_HEADER;

mod common;
use common::test_app;

fn server() -> TestServer {
    TestServer::new(test_app()).unwrap()
}

fn token_value(token: &str) -> HeaderValue {
    HeaderValue::from_str(token).unwrap()
}

fn token_of(json: &Value) -> String {
    json["token"].as_str().unwrap().to_string()
}

/// Anonymous → Identified → ScopedToUnits → ScopedToUnit, then back to units.
#[tokio::test]
async fn test_full_session_walk() {
    let server = server();

    let response = server
        .post("/login")
        .json(&json!({"email": "fireman.sam@example.com"}))
        .await;
    response.assert_status_ok();
    let identified = token_of(&response.json::<Value>());

    let response = server
        .get("/profile")
        .add_header(TOKEN_HEADER, token_value(&identified))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "Fireman Sam");

    let response = server
        .get("/respondent_units")
        .add_header(TOKEN_HEADER, token_value(&identified))
        .await;
    response.assert_status_ok();
    let scoped = token_of(&response.json::<Value>());

    let response = server
        .get("/questionnaires")
        .add_query_param("reference", "223")
        .add_header(TOKEN_HEADER, token_value(&scoped))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["questionnaires"].as_array().unwrap().len(), 2);
    let with_questionnaires = token_of(&body);

    // Fetching units again keeps the questionnaires already granted.
    let response = server
        .get("/respondent_units")
        .add_header(TOKEN_HEADER, token_value(&with_questionnaires))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(
        body["respondent_units"][0]["questionnaires"]
            .as_array()
            .unwrap()
            .len(),
        2
    );

    // Every token in the lineage still identifies the respondent.
    for token in [&identified, &scoped, &with_questionnaires] {
        let response = server
            .get("/profile")
            .add_header(TOKEN_HEADER, token_value(token))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["respondent_id"], "103");
    }
}

#[tokio::test]
async fn test_code_session_cannot_reach_profile() {
    let server = server();

    let response = server
        .post("/code")
        .json(&json!({"code": "pqr678"}))
        .await;
    response.assert_status_ok();
    let token = token_of(&response.json::<Value>());

    let response = server
        .get("/profile")
        .add_header(TOKEN_HEADER, token_value(&token))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "INCOMPLETE_CLAIMS");
}

#[tokio::test]
async fn test_profile_update_visible_to_later_tokens() {
    let server = server();

    let response = server
        .post("/login")
        .json(&json!({"email": "rob.dabank@example.com"}))
        .await;
    let token = token_of(&response.json::<Value>());

    let response = server
        .post("/profile")
        .add_header(TOKEN_HEADER, token_value(&token))
        .json(&json!({"name": "Rob"}))
        .await;
    response.assert_status_ok();

    // A fresh login sees the new name.
    let response = server
        .post("/login")
        .json(&json!({"email": "rob.dabank@example.com"}))
        .await;
    let fresh = token_of(&response.json::<Value>());

    let response = server
        .get("/profile")
        .add_header(TOKEN_HEADER, token_value(&fresh))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["name"], "Rob");
    assert_eq!(body["email"], "rob.dabank@example.com");
    assert_eq!(body["respondent_id"], "104");
}

#[tokio::test]
async fn test_unit_scope_is_enforced_across_endpoints() {
    let server = server();

    let response = server
        .post("/login")
        .json(&json!({"email": "rob.dabank@example.com"}))
        .await;
    let token = token_of(&response.json::<Value>());

    let response = server
        .get("/respondent_units")
        .add_header(TOKEN_HEADER, token_value(&token))
        .await;
    let scoped = token_of(&response.json::<Value>());

    for path in ["/questionnaires", "/respondents"] {
        let response = server
            .get(path)
            .add_query_param("reference", "223")
            .add_header(TOKEN_HEADER, token_value(&scoped))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED, "{path}");

        let response = server
            .get(path)
            .add_query_param("reference", "224")
            .add_header(TOKEN_HEADER, token_value(&scoped))
            .await;
        response.assert_status_ok();
    }
}
