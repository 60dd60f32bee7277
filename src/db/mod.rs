// Storage seams for users, access tokens and password reset records
// The service only talks to these traits; `memory` ships the default implementations.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AuthToken, NewUser, PasswordResetRecord, User};

pub use memory::{InMemoryPasswordResetStore, InMemoryTokenStore, InMemoryUserStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Record not found")]
    NotFound,

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Lookup by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Must fail with [`StoreError::DuplicateEmail`] when the email is taken
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Returns `true` only when the user moved from unverified to verified
    async fn mark_email_verified(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;

    async fn update_password(&self, id: Uuid, password_hash: String) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: AuthToken) -> Result<(), StoreError>;

    /// Revoke every token of `user_id` and store `token` as one atomic step.
    /// Returns how many tokens were revoked.
    async fn rotate(&self, user_id: Uuid, token: AuthToken) -> Result<usize, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthToken>, StoreError>;

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn revoke_all(&self, user_id: Uuid) -> Result<usize, StoreError>;

    async fn count_for_user(&self, user_id: Uuid) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait PasswordResetStore: Send + Sync {
    /// Insert or replace the record for its email
    async fn put(&self, record: PasswordResetRecord) -> Result<(), StoreError>;

    async fn get(&self, email: &str) -> Result<Option<PasswordResetRecord>, StoreError>;

    async fn delete(&self, email: &str) -> Result<(), StoreError>;

    /// Remove records created before `cutoff`, returning the count removed
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}
