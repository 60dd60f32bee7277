use base64::prelude::*;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::{
    db::{PasswordResetStore, StoreError},
    models::PasswordResetRecord,
};

#[derive(Debug)]
pub struct PasswordResetTokenInfo {
    pub token: String,      // Raw token (to send in email)
    pub token_hash: String, // Hashed token (to store)
}

/// Issues, validates and consumes password reset tokens
#[derive(Clone)]
pub struct PasswordBroker {
    store: Arc<dyn PasswordResetStore>,
    ttl: Duration,
    throttle: Duration,
}

impl PasswordBroker {
    pub fn new(store: Arc<dyn PasswordResetStore>, ttl: Duration, throttle: Duration) -> Self {
        Self {
            store,
            ttl,
            throttle,
        }
    }

    /// Generate a cryptographically secure password reset token
    pub fn generate_reset_token() -> PasswordResetTokenInfo {
        // 256 bits of entropy, base64url for safe URL transmission
        let mut token_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut token_bytes);
        let token = BASE64_URL_SAFE_NO_PAD.encode(token_bytes);

        PasswordResetTokenInfo {
            token_hash: Self::hash_token(&token),
            token,
        }
    }

    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Store a fresh token for `email`, replacing any previous one.
    /// Returns `None` when a token was issued within the throttle window.
    pub async fn create_token(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, StoreError> {
        if let Some(existing) = self.store.get(email).await? {
            if existing.was_recently_created(self.throttle, now) {
                debug!(email = email, "Password reset throttled");
                return Ok(None);
            }
        }

        let token_info = Self::generate_reset_token();
        self.store
            .put(PasswordResetRecord::new(
                email.to_string(),
                token_info.token_hash,
                now,
            ))
            .await?;

        info!(email = email, "Password reset token created");
        Ok(Some(token_info.token))
    }

    /// Whether `token` is the current, unexpired reset token for `email`
    pub async fn validate(
        &self,
        email: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let Some(record) = self.store.get(email).await? else {
            return Ok(false);
        };

        let candidate = Self::hash_token(token);
        let matches: bool = record
            .token_hash
            .as_bytes()
            .ct_eq(candidate.as_bytes())
            .into();

        Ok(matches && !record.is_expired(self.ttl, now))
    }

    pub async fn delete(&self, email: &str) -> Result<(), StoreError> {
        self.store.delete(email).await
    }

    /// Cleanup expired tokens
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.store.purge_expired(now - self.ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryPasswordResetStore;

    fn broker() -> PasswordBroker {
        PasswordBroker::new(
            Arc::new(InMemoryPasswordResetStore::new()),
            Duration::minutes(60),
            Duration::seconds(60),
        )
    }

    #[test]
    fn test_generate_reset_token() {
        let token_info = PasswordBroker::generate_reset_token();

        // 32 bytes base64url without padding
        assert_eq!(token_info.token.len(), 43);
        // SHA-256 hex
        assert_eq!(token_info.token_hash.len(), 64);
        assert_ne!(token_info.token, token_info.token_hash);
    }

    #[tokio::test]
    async fn test_token_validates_until_expiry() {
        let broker = broker();
        let now = Utc::now();
        let token = broker.create_token("a@x.com", now).await.unwrap().unwrap();

        assert!(broker.validate("a@x.com", &token, now).await.unwrap());
        assert!(!broker.validate("a@x.com", "wrong", now).await.unwrap());
        assert!(!broker.validate("b@x.com", &token, now).await.unwrap());
        assert!(!broker
            .validate("a@x.com", &token, now + Duration::minutes(61))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_second_request_inside_throttle_window_is_skipped() {
        let broker = broker();
        let now = Utc::now();

        let first = broker.create_token("a@x.com", now).await.unwrap();
        let second = broker
            .create_token("a@x.com", now + Duration::seconds(10))
            .await
            .unwrap();
        let third = broker
            .create_token("a@x.com", now + Duration::seconds(61))
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        let third = third.unwrap();

        // The newer token replaces the older one
        let later = now + Duration::seconds(62);
        assert!(broker.validate("a@x.com", &third, later).await.unwrap());
        assert!(!broker.validate("a@x.com", &first.unwrap(), later).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_consumes_token() {
        let broker = broker();
        let now = Utc::now();
        let token = broker.create_token("a@x.com", now).await.unwrap().unwrap();

        broker.delete("a@x.com").await.unwrap();
        assert!(!broker.validate("a@x.com", &token, now).await.unwrap());
    }
}
