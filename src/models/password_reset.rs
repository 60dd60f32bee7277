use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One outstanding reset token per email; a new request replaces the old one
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordResetRecord {
    pub email: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetRecord {
    pub fn new(email: String, token_hash: String, created_at: DateTime<Utc>) -> Self {
        Self {
            email,
            token_hash,
            created_at,
        }
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.created_at + ttl <= now
    }

    pub fn was_recently_created(&self, throttle: Duration, now: DateTime<Utc>) -> bool {
        self.created_at + throttle > now
    }
}

// Request models for API
#[derive(Debug, Serialize, Deserialize, validator::Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, validator::Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "The token field is required."))]
    #[serde(default)]
    pub token: String,

    #[validate(email(message = "The email must be a valid email address."))]
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub password_confirmation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_and_throttle_windows() {
        let created = Utc::now();
        let record = PasswordResetRecord::new("a@x.com".into(), "hash".into(), created);

        assert!(!record.is_expired(Duration::minutes(60), created + Duration::minutes(59)));
        assert!(record.is_expired(Duration::minutes(60), created + Duration::minutes(60)));

        assert!(record.was_recently_created(Duration::seconds(60), created + Duration::seconds(30)));
        assert!(!record.was_recently_created(Duration::seconds(60), created + Duration::seconds(61)));
    }
}
