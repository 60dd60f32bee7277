pub mod auth;

use crate::{
    app::AppState,
    middleware::{auth_middleware, throttle_verification_notifications},
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

// Authentication routes
pub fn auth_routes(state: AppState) -> Router<AppState> {
    // Throttle runs inside auth so it can key on the user
    let throttled = Router::new()
        .route(
            "/email/verification-notification",
            post(auth::send_email_verification),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            throttle_verification_notifications,
        ));

    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .route("/verify-email/{id}/{hash}", get(auth::verify_email))
        .route("/user", get(auth::current_user))
        .merge(throttled)
        .route_layer(from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .merge(protected)
}
