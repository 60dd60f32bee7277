// Authentication Handlers
// Thin translation between HTTP and AuthEndpoint

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use axum_extra::{extract::WithRejection, headers::UserAgent, TypedHeader};
use serde_json::Value;

use crate::{
    app::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
        StatusResponse, TokenResponse, UserResponse, VerifyEmailQuery,
    },
    services::auth::{
        PASSWORD_RESET_LINK_STATUS, PASSWORD_RESET_STATUS, VERIFICATION_LINK_SENT_STATUS,
    },
    utils::auth_errors::{log_auth_failure, AuthError},
};

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, AuthError>,
) -> Result<StatusCode, AuthError> {
    state.auth.register(payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /login - returns `{"token": "..."}`
pub async fn login(
    State(state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AuthError>,
) -> Result<Json<TokenResponse>, AuthError> {
    let email = payload.email.clone();

    match state.auth.login(payload).await {
        Ok(token) => Ok(Json(TokenResponse { token })),
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                log_auth_failure(
                    &email,
                    &e,
                    user_agent.as_ref().map(|TypedHeader(ua)| ua.as_str()),
                );
            }
            Err(e)
        },
    }
}

/// POST /logout - revokes every token of the caller, responds with `null`
pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AuthError> {
    state.auth.logout(&user).await?;
    Ok((StatusCode::OK, Json(Value::Null)))
}

/// POST /email/verification-notification
pub async fn send_email_verification(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<StatusResponse>, AuthError> {
    state.auth.send_email_verification(&user).await?;
    Ok(Json(StatusResponse::new(VERIFICATION_LINK_SENT_STATUS)))
}

/// GET /verify-email/{id}/{hash}?expires=..&signature=..
pub async fn verify_email(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, hash)): Path<(String, String)>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<Value>, AuthError> {
    state.auth.verify_email(&user, &id, &hash, &query).await?;
    Ok(Json(Value::Null))
}

/// POST /forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<ForgotPasswordRequest>, AuthError>,
) -> Result<Json<StatusResponse>, AuthError> {
    state.auth.forgot_password(payload).await?;
    Ok(Json(StatusResponse::new(PASSWORD_RESET_LINK_STATUS)))
}

/// POST /reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<ResetPasswordRequest>, AuthError>,
) -> Result<Json<StatusResponse>, AuthError> {
    state.auth.reset_password(payload).await?;
    Ok(Json(StatusResponse::new(PASSWORD_RESET_STATUS)))
}

/// GET /user
pub async fn current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<UserResponse> {
    Json(state.auth.current_user(&user))
}
