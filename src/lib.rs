// Library exports for the token auth service
// The binary and the integration tests both assemble the app through these functions

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use chrono::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, ConfigError, EmailProvider};
pub use middleware::{auth_middleware, AuthenticatedUser, CorsPolicy};
pub use services::{
    AuditLogListener, AuthDependencies, AuthEndpoint, AuthEvent, AuthEventListener,
    AuthSettings, EventDispatcher, LinkSigner, NotificationSender,
};
pub use utils::AuthError;

// Re-export handler route builders
pub use handlers::auth_routes;

/// Wire the endpoint from configuration, using the in-memory stores
pub fn build_auth_endpoint(config: &AppConfig) -> anyhow::Result<AuthEndpoint> {
    let notifier: Arc<dyn NotificationSender> = match config.email.provider {
        EmailProvider::Resend => Arc::new(services::EmailService::new(
            config.email.clone(),
            config.auth.password_reset_expire_minutes,
        )?),
        EmailProvider::Log => Arc::new(services::LogNotificationSender::new(
            config.email.frontend_url.clone(),
        )),
    };
    info!(provider = ?config.email.provider, "Notification sender ready");

    let deps = AuthDependencies {
        users: Arc::new(db::InMemoryUserStore::new()),
        tokens: Arc::new(db::InMemoryTokenStore::new()),
        password_resets: Arc::new(db::InMemoryPasswordResetStore::new()),
        hasher: Arc::new(utils::Argon2Hasher::new(config.password_config())),
        notifier,
        signer: LinkSigner::new(
            config.security.app_key.as_bytes(),
            Duration::minutes(config.auth.verification_expire_minutes),
        ),
        events: EventDispatcher::new().with_listener(Arc::new(AuditLogListener)),
    };

    Ok(AuthEndpoint::new(deps, config.auth_settings()))
}

/// Full application router: health check, auth routes, CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes(state.clone()))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::dynamic_cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Health check handler
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
