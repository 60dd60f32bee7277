// Common test utilities and helper structs
// Shared across all test files to avoid duplication

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::Duration;
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use token_auth_service::{
    app_config::RateLimitConfig,
    build_router,
    db::{InMemoryPasswordResetStore, InMemoryTokenStore, InMemoryUserStore},
    models::User,
    services::{email::EmailError, SignedVerificationLink},
    utils::{Argon2Hasher, PasswordConfig},
    AppState, AuthDependencies, AuthEndpoint, AuthEvent, AuthEventListener, AuthSettings,
    CorsPolicy, EventDispatcher, LinkSigner, NotificationSender,
};
use tower::util::ServiceExt;
use uuid::Uuid;

pub const TEST_APP_KEY: &[u8] = b"integration-test-app-key-0123456789abcdef";

/// Captures notifications instead of sending them
#[derive(Default)]
pub struct RecordingNotifier {
    verification_links: Mutex<Vec<(String, SignedVerificationLink)>>,
    reset_tokens: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn verification_links_for(&self, email: &str) -> Vec<SignedVerificationLink> {
        self.verification_links
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == email)
            .map(|(_, link)| link.clone())
            .collect()
    }

    pub fn last_verification_link(&self, email: &str) -> Option<SignedVerificationLink> {
        self.verification_links_for(email).pop()
    }

    pub fn reset_tokens_for(&self, email: &str) -> Vec<String> {
        self.reset_tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
            .collect()
    }

    pub fn last_reset_token(&self, email: &str) -> Option<String> {
        self.reset_tokens_for(email).pop()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send_email_verification(
        &self,
        user: &User,
        link: &SignedVerificationLink,
    ) -> Result<(), EmailError> {
        self.verification_links
            .lock()
            .unwrap()
            .push((user.email.clone(), link.clone()));
        Ok(())
    }

    async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), EmailError> {
        self.reset_tokens
            .lock()
            .unwrap()
            .push((user.email.clone(), token.to_string()));
        Ok(())
    }
}

/// Captures dispatched events
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<AuthEvent>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<AuthEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }
}

impl AuthEventListener for RecordingListener {
    fn handle(&self, event: &AuthEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub notifier: Arc<RecordingNotifier>,
    pub events: Arc<RecordingListener>,
    pub users: Arc<InMemoryUserStore>,
    pub tokens: Arc<InMemoryTokenStore>,
    pub signer: LinkSigner,
}

impl TestApp {
    pub fn post(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "POST", uri)
    }

    pub fn get(&self, uri: &str) -> TestRequest {
        TestRequest::new(self, "GET", uri)
    }

    /// Register through the API and assert it succeeded
    pub async fn register(&self, name: &str, email: &str, password: &str) {
        let response = self
            .post("/register")
            .json(&json!({
                "name": name,
                "email": email,
                "password": password,
                "password_confirmation": password,
            }))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT, "registration failed");
    }

    /// Log in through the API and return the bearer token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login failed");
        let body: serde_json::Value = response.json().await;
        body["token"].as_str().expect("token in body").to_string()
    }

    pub async fn register_and_login(&self, email: &str, password: &str) -> String {
        self.register("Test User", email, password).await;
        self.login(email, password).await
    }

    pub async fn user_id(&self, token: &str) -> Uuid {
        let response = self.get("/user").bearer(token).send().await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await;
        body["id"].as_str().and_then(|id| id.parse().ok()).expect("user id")
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: &'static str,
    uri: String,
    bearer: Option<String>,
    body: Option<Vec<u8>>,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &'static str, uri: &str) -> Self {
        Self {
            app,
            method,
            uri: uri.to_string(),
            bearer: None,
            body: None,
        }
    }

    /// Add JSON body to request
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        self.body = Some(serde_json::to_vec(body).unwrap());
        self
    }

    /// Raw body sent as `application/json`, for payloads that are not valid JSON
    pub fn raw_json(mut self, body: &str) -> Self {
        self.body = Some(body.as_bytes().to_vec());
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub async fn send(self) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(&self.uri);
        if let Some(token) = &self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body)),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.app.clone().oneshot(request).await.unwrap();
        TestResponse { response }
    }
}

/// Test response wrapper
pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub async fn json<T: serde::de::DeserializeOwned>(self) -> T {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    pub async fn text(self) -> String {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }
}

pub fn test_settings() -> AuthSettings {
    AuthSettings {
        password_min_length: 1,
        ..AuthSettings::default()
    }
}

/// Setup test application with in-memory collaborators
pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_settings(), 6)
}

pub fn setup_test_app_with(settings: AuthSettings, verification_per_minute: u32) -> TestApp {
    let notifier = Arc::new(RecordingNotifier::default());
    let events = Arc::new(RecordingListener::default());
    let users = Arc::new(InMemoryUserStore::new());
    let tokens = Arc::new(InMemoryTokenStore::new());
    let signer = LinkSigner::new(TEST_APP_KEY, Duration::minutes(60));

    let deps = AuthDependencies {
        users: users.clone(),
        tokens: tokens.clone(),
        password_resets: Arc::new(InMemoryPasswordResetStore::new()),
        // Cheap parameters keep the suite fast
        hasher: Arc::new(Argon2Hasher::new(PasswordConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_length: 32,
        })),
        notifier: notifier.clone(),
        signer: signer.clone(),
        events: EventDispatcher::new().with_listener(events.clone()),
    };

    let endpoint = Arc::new(AuthEndpoint::new(deps, settings));
    let state = AppState::new(
        endpoint,
        &RateLimitConfig {
            verification_notification_per_minute: verification_per_minute,
        },
        CorsPolicy::default(),
    );

    TestApp {
        app: build_router(state),
        notifier,
        events,
        users,
        tokens,
        signer,
    }
}

/// Unique email per test to keep assertions readable
pub fn unique_email(prefix: &str) -> String {
    format!("{}_{}@example.com", prefix, Uuid::new_v4().simple())
}
