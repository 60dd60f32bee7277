// Authentication middleware for protected routes
// Resolves the bearer token and injects AuthenticatedUser into request extensions

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::{app::AppState, middleware::auth::AuthenticatedUser, utils::AuthError};

/// Token from an `Authorization: Bearer ...` header. The scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

/// Middleware function that validates bearer tokens and adds AuthenticatedUser to extensions
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        debug!(path = %request.uri().path(), "Missing or invalid authorization header");
        return Err(AuthError::Unauthenticated);
    };

    let auth_user = app_state.auth.authenticate(&token).await?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Lets handlers take `AuthenticatedUser` directly as an argument
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}
