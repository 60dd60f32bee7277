// Per-user throttle for verification notification requests

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::num::NonZeroU32;
use tracing::warn;
use uuid::Uuid;

use crate::{app::AppState, middleware::auth::AuthenticatedUser, utils::AuthError};

pub type UserRateLimiter = DefaultKeyedRateLimiter<Uuid>;

/// `per_minute` requests per user as a GCRA quota: a burst of `per_minute`, then one
/// request back every `60 / per_minute` seconds rather than a fixed one-minute window
pub fn user_rate_limiter(per_minute: u32) -> UserRateLimiter {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    RateLimiter::keyed(Quota::per_minute(per_minute))
}

/// Must run inside `auth_middleware`, which provides the user key
pub async fn throttle_verification_notifications(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user_id = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(AuthenticatedUser::user_id)
        .ok_or(AuthError::Unauthenticated)?;

    if let Err(not_until) = state.verification_limiter.check_key(&user_id) {
        let wait = not_until.wait_time_from(DefaultClock::default().now());
        let retry_after_seconds = wait.as_secs().max(1);
        warn!(user_id = %user_id, retry_after_seconds, "Verification notification throttled");
        return Err(AuthError::RateLimited {
            retry_after_seconds,
        });
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_allows_burst_then_blocks() {
        let limiter = user_rate_limiter(6);
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        for _ in 0..6 {
            assert!(limiter.check_key(&user).is_ok());
        }
        assert!(limiter.check_key(&user).is_err());
        // Keys are independent
        assert!(limiter.check_key(&other).is_ok());
    }

    #[test]
    fn test_exhausted_burst_refills_one_slot_at_a_time() {
        let limiter = user_rate_limiter(6);
        let user = Uuid::new_v4();

        for _ in 0..6 {
            assert!(limiter.check_key(&user).is_ok());
        }
        let not_until = limiter.check_key(&user).unwrap_err();
        let wait = not_until.wait_time_from(DefaultClock::default().now());

        // Next slot opens after 60s / 6, not after a whole minute
        assert!(wait <= std::time::Duration::from_secs(10));
        assert!(wait > std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_zero_quota_falls_back_to_one() {
        let limiter = user_rate_limiter(0);
        let user = Uuid::new_v4();
        assert!(limiter.check_key(&user).is_ok());
        assert!(limiter.check_key(&user).is_err());
    }
}
