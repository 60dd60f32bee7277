// Application state shared across handlers
use std::sync::Arc;

use crate::{
    app_config::RateLimitConfig,
    middleware::{user_rate_limiter, CorsPolicy, UserRateLimiter},
    services::AuthEndpoint,
};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthEndpoint>,
    pub verification_limiter: Arc<UserRateLimiter>,
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    pub fn new(auth: Arc<AuthEndpoint>, rate_limit: &RateLimitConfig, cors: CorsPolicy) -> Self {
        Self {
            auth,
            verification_limiter: Arc::new(user_rate_limiter(
                rate_limit.verification_notification_per_minute,
            )),
            cors: Arc::new(cors),
        }
    }
}
