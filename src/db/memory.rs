// In-memory stores backed by tokio RwLocks

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PasswordResetStore, StoreError, TokenStore, UserStore};
use crate::models::{AuthToken, NewUser, PasswordResetRecord, User};

#[derive(Default)]
struct UserTable {
    by_id: HashMap<Uuid, User>,
    id_by_email: HashMap<String, Uuid>,
}

#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.inner.read().await;
        Ok(table
            .id_by_email
            .get(&email.to_lowercase())
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .id_by_email
            .contains_key(&email.to_lowercase()))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut table = self.inner.write().await;
        let key = new_user.email.to_lowercase();
        if table.id_by_email.contains_key(&key) {
            return Err(StoreError::DuplicateEmail(new_user.email));
        }

        let user = new_user.into_user(Utc::now());
        table.id_by_email.insert(key, user.id);
        table.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn mark_email_verified(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut table = self.inner.write().await;
        let user = table.by_id.get_mut(&id).ok_or(StoreError::NotFound)?;
        if user.email_verified_at.is_some() {
            return Ok(false);
        }
        user.email_verified_at = Some(at);
        user.updated_at = at;
        Ok(true)
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> Result<(), StoreError> {
        let mut table = self.inner.write().await;
        let user = table.by_id.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash;
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<Uuid, AuthToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn remove_user_tokens(tokens: &mut HashMap<Uuid, AuthToken>, user_id: Uuid) -> usize {
    let before = tokens.len();
    tokens.retain(|_, token| token.user_id != user_id);
    before - tokens.len()
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, token: AuthToken) -> Result<(), StoreError> {
        self.tokens.write().await.insert(token.id, token);
        Ok(())
    }

    async fn rotate(&self, user_id: Uuid, token: AuthToken) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.write().await;
        let revoked = remove_user_tokens(&mut tokens, user_id);
        tokens.insert(token.id, token);
        Ok(revoked)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthToken>, StoreError> {
        Ok(self.tokens.read().await.get(&id).cloned())
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(token) = self.tokens.write().await.get_mut(&id) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn revoke_all(&self, user_id: Uuid) -> Result<usize, StoreError> {
        let mut tokens = self.tokens.write().await;
        Ok(remove_user_tokens(&mut tokens, user_id))
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<usize, StoreError> {
        Ok(self
            .tokens
            .read()
            .await
            .values()
            .filter(|token| token.user_id == user_id)
            .count())
    }
}

#[derive(Default)]
pub struct InMemoryPasswordResetStore {
    records: RwLock<HashMap<String, PasswordResetRecord>>,
}

impl InMemoryPasswordResetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PasswordResetStore for InMemoryPasswordResetStore {
    async fn put(&self, record: PasswordResetRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.email.to_lowercase(), record);
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<PasswordResetRecord>, StoreError> {
        Ok(self.records.read().await.get(&email.to_lowercase()).cloned())
    }

    async fn delete(&self, email: &str) -> Result<(), StoreError> {
        self.records.write().await.remove(&email.to_lowercase());
        Ok(())
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.created_at >= cutoff);
        Ok(before - records.len())
    }
}
