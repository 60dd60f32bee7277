// Integration tests for POST /forgot-password and POST /reset-password

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{setup_test_app, unique_email, TestApp};

const GENERIC_STATUS: &str =
    "If an account exists for that email, a password reset link has been sent.";

async fn request_reset(app: &TestApp, email: &str) -> serde_json::Value {
    let response = app
        .post("/forgot-password")
        .json(&json!({ "email": email }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await
}

async fn reset(app: &TestApp, email: &str, token: &str, password: &str) -> common::TestResponse {
    app.post("/reset-password")
        .json(&json!({
            "token": token,
            "email": email,
            "password": password,
            "password_confirmation": password,
        }))
        .send()
        .await
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let app = setup_test_app();
    let known = unique_email("known");
    let unknown = unique_email("unknown");
    app.register("Known", &known, "pw").await;

    let known_body = request_reset(&app, &known).await;
    let unknown_body = request_reset(&app, &unknown).await;

    assert_eq!(known_body, unknown_body);
    assert_eq!(known_body["status"], GENERIC_STATUS);
    assert_eq!(app.notifier.reset_tokens_for(&known).len(), 1);
    assert!(app.notifier.reset_tokens_for(&unknown).is_empty());
}

#[tokio::test]
async fn test_forgot_password_requires_valid_email() {
    let app = setup_test_app();

    let response = app
        .post("/forgot-password")
        .json(&json!({ "email": "nope" }))
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await;
    assert!(body["errors"]["email"].is_array());
}

#[tokio::test]
async fn test_forgot_password_is_throttled() {
    let app = setup_test_app();
    let email = unique_email("throttled");
    app.register("Throttled", &email, "pw").await;

    request_reset(&app, &email).await;
    // Same generic answer, but no second email inside the window
    let body = request_reset(&app, &email).await;

    assert_eq!(body["status"], GENERIC_STATUS);
    assert_eq!(app.notifier.reset_tokens_for(&email).len(), 1);
}

#[tokio::test]
async fn test_reset_password_flow() {
    let app = setup_test_app();
    let email = unique_email("reset");
    app.register("Reset", &email, "old-password").await;
    let session = app.login(&email, "old-password").await;

    request_reset(&app, &email).await;
    let token = app.notifier.last_reset_token(&email).expect("reset token");

    let response = reset(&app, &email, &token, "new-password").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await;
    assert_eq!(body["status"], "Your password has been reset.");
    assert_eq!(app.events.count("password_reset"), 1);

    // Existing sessions are gone
    let response = app.get("/user").bearer(&session).send().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Old password no longer works, new one does
    let response = app
        .post("/login")
        .json(&json!({ "email": email, "password": "old-password" }))
        .send()
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    app.login(&email, "new-password").await;
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let app = setup_test_app();
    let email = unique_email("single");
    app.register("Single", &email, "pw").await;

    request_reset(&app, &email).await;
    let token = app.notifier.last_reset_token(&email).unwrap();

    let response = reset(&app, &email, &token, "first").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = reset(&app, &email, &token, "second").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await;
    assert_eq!(body["errors"]["email"][0], "This password reset token is invalid.");

    app.login(&email, "first").await;
}

#[tokio::test]
async fn test_reset_with_wrong_token_or_email() {
    let app = setup_test_app();
    let email = unique_email("wrong");
    app.register("Wrong", &email, "pw").await;
    request_reset(&app, &email).await;
    let token = app.notifier.last_reset_token(&email).unwrap();

    let response = reset(&app, &email, "not-the-token", "changed").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let wrong_token: serde_json::Value = response.json().await;

    // Unknown account looks exactly like a bad token
    let response = reset(&app, &unique_email("stranger"), &token, "changed").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let unknown_email: serde_json::Value = response.json().await;

    assert_eq!(wrong_token, unknown_email);
    assert_eq!(app.events.count("password_reset"), 0);
    app.login(&email, "pw").await;
}

#[tokio::test]
async fn test_reset_password_confirmation_mismatch() {
    let app = setup_test_app();
    let email = unique_email("confirm");
    app.register("Confirm", &email, "pw").await;
    request_reset(&app, &email).await;
    let token = app.notifier.last_reset_token(&email).unwrap();

    let response = app
        .post("/reset-password")
        .json(&json!({
            "token": token,
            "email": email,
            "password": "new-password",
            "password_confirmation": "typo",
        }))
        .send()
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await;
    assert_eq!(
        body["errors"]["password"][0],
        "The password confirmation does not match."
    );

    // Token survives a failed attempt
    let response = reset(&app, &email, &token, "new-password").await;
    assert_eq!(response.status(), StatusCode::OK);
}
