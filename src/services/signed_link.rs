// Signed, expiring email verification links
//
// The signature is HMAC-SHA256 over the link path including its `expires` query,
// so neither the user id, the email hash nor the expiry can be altered.

use base64::prelude::*;
use chrono::{DateTime, Duration, Utc};
use ring::hmac;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::utils::normalize_email;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LinkError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Link has expired")]
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedVerificationLink {
    pub user_id: Uuid,
    pub hash: String,
    /// Unix timestamp (seconds)
    pub expires: i64,
    pub signature: String,
}

impl SignedVerificationLink {
    /// Relative URL, e.g. `/verify-email/{id}/{hash}?expires=...&signature=...`
    pub fn path(&self) -> String {
        format!(
            "{}&signature={}",
            unsigned_path(self.user_id, &self.hash, self.expires),
            self.signature
        )
    }
}

fn unsigned_path(user_id: Uuid, hash: &str, expires: i64) -> String {
    format!("/verify-email/{}/{}?expires={}", user_id, hash, expires)
}

#[derive(Clone)]
pub struct LinkSigner {
    key: hmac::Key,
    ttl: Duration,
}

impl LinkSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
            ttl,
        }
    }

    /// SHA-256 hex of the normalized email, embedded in the link path
    pub fn email_hash(email: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalize_email(email).as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn sign_verification(&self, user_id: Uuid, email: &str) -> SignedVerificationLink {
        self.sign_verification_at(user_id, email, Utc::now())
    }

    pub fn sign_verification_at(
        &self,
        user_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> SignedVerificationLink {
        let expires = (now + self.ttl).timestamp();
        self.sign(user_id, &Self::email_hash(email), expires)
    }

    /// Sign an arbitrary tuple. Mostly useful for crafting links in tests.
    pub fn sign(&self, user_id: Uuid, hash: &str, expires: i64) -> SignedVerificationLink {
        let tag = hmac::sign(&self.key, unsigned_path(user_id, hash, expires).as_bytes());

        SignedVerificationLink {
            user_id,
            hash: hash.to_string(),
            expires,
            signature: BASE64_URL_SAFE_NO_PAD.encode(tag.as_ref()),
        }
    }

    /// Check the signature (constant time) and then the expiry
    pub fn verify(
        &self,
        user_id: Uuid,
        hash: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), LinkError> {
        let signature = BASE64_URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| LinkError::InvalidSignature)?;

        hmac::verify(
            &self.key,
            unsigned_path(user_id, hash, expires).as_bytes(),
            &signature,
        )
        .map_err(|_| LinkError::InvalidSignature)?;

        if now.timestamp() >= expires {
            debug!(user_id = %user_id, expires, "Verification link expired");
            return Err(LinkError::Expired);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> LinkSigner {
        LinkSigner::new(
            b"test-app-key-that-is-at-least-32-characters",
            Duration::minutes(60),
        )
    }

    #[test]
    fn test_signed_link_verifies() {
        let signer = signer();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let link = signer.sign_verification_at(user_id, "a@x.com", now);

        assert_eq!(link.hash, LinkSigner::email_hash("A@X.com"));
        assert_eq!(
            signer.verify(user_id, &link.hash, link.expires, &link.signature, now),
            Ok(())
        );
        assert!(link.path().starts_with(&format!("/verify-email/{}/", user_id)));
        assert!(link.path().contains("&signature="));
    }

    #[test]
    fn test_expired_link_is_rejected() {
        let signer = signer();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let link = signer.sign_verification_at(user_id, "a@x.com", now);

        let later = now + Duration::minutes(61);
        assert_eq!(
            signer.verify(user_id, &link.hash, link.expires, &link.signature, later),
            Err(LinkError::Expired)
        );
    }

    #[test]
    fn test_tampered_fields_are_rejected() {
        let signer = signer();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let link = signer.sign_verification_at(user_id, "a@x.com", now);

        assert_eq!(
            signer.verify(Uuid::new_v4(), &link.hash, link.expires, &link.signature, now),
            Err(LinkError::InvalidSignature)
        );
        assert_eq!(
            signer.verify(user_id, "deadbeef", link.expires, &link.signature, now),
            Err(LinkError::InvalidSignature)
        );
        assert_eq!(
            signer.verify(user_id, &link.hash, link.expires + 3600, &link.signature, now),
            Err(LinkError::InvalidSignature)
        );
        assert_eq!(
            signer.verify(user_id, &link.hash, link.expires, "%%%", now),
            Err(LinkError::InvalidSignature)
        );
    }

    #[test]
    fn test_different_keys_do_not_cross_verify() {
        let other = LinkSigner::new(b"a-completely-different-key-of-32-chars!", Duration::minutes(60));
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let link = signer().sign_verification_at(user_id, "a@x.com", now);

        assert_eq!(
            other.verify(user_id, &link.hash, link.expires, &link.signature, now),
            Err(LinkError::InvalidSignature)
        );
    }
}
