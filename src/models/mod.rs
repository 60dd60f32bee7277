pub mod auth;
pub mod password_reset;
pub mod token;
pub mod user;

// Re-export common types
pub use auth::*;
pub use password_reset::*;
pub use token::{parse_plain_text_token, AuthToken, NewAccessToken};
pub use user::*;
