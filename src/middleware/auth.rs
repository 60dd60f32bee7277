use uuid::Uuid;

use crate::models::User;

/// The user behind a valid bearer token, loaded fresh for the current request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token_id: Uuid,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }
}
