// Personal access tokens handed out on login
//
// Clients hold `{token_id}|{secret}`; only the SHA-256 of the secret is stored.

use base64::prelude::*;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

pub const TOKEN_SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// A freshly issued token together with the only copy of its plain text
#[derive(Debug, Clone)]
pub struct NewAccessToken {
    pub token: AuthToken,
    pub plain_text_token: String,
}

impl AuthToken {
    /// Token name used for login sessions
    pub fn login_name(user_id: Uuid) -> String {
        format!("login:user{}", user_id)
    }

    pub fn issue(user_id: Uuid, name: impl Into<String>) -> NewAccessToken {
        // 32 bytes of randomness, base64url so it survives headers and URLs
        let mut secret_bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret_bytes);
        let secret = BASE64_URL_SAFE_NO_PAD.encode(secret_bytes);

        let token = AuthToken {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            token_hash: Self::hash_secret(&secret),
            created_at: Utc::now(),
            last_used_at: None,
        };

        NewAccessToken {
            plain_text_token: format!("{}{}{}", token.id, TOKEN_SEPARATOR, secret),
            token,
        }
    }

    pub fn hash_secret(secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Constant-time check of a presented secret against the stored hash
    pub fn matches(&self, secret: &str) -> bool {
        let candidate = Self::hash_secret(secret);
        self.token_hash.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

/// Split `{id}|{secret}` into its parts. Anything malformed yields `None`.
pub fn parse_plain_text_token(token: &str) -> Option<(Uuid, &str)> {
    let (id, secret) = token.split_once(TOKEN_SEPARATOR)?;
    let id = Uuid::parse_str(id).ok()?;
    if secret.is_empty() {
        return None;
    }
    Some((id, secret))
}
