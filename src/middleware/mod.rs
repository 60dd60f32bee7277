// Middleware for the auth service: bearer authentication, throttling and CORS

pub mod auth;
pub mod auth_middleware;
pub mod cors;
pub mod rate_limit;

// Re-export auth types
pub use auth::AuthenticatedUser;
pub use auth_middleware::{auth_middleware, bearer_token};
pub use cors::{dynamic_cors_middleware, CorsPolicy};
pub use rate_limit::{throttle_verification_notifications, user_rate_limiter, UserRateLimiter};
