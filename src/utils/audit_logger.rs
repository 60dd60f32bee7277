// Audit logging for authentication lifecycle events
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::events::AuthEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    UserRegistered,
    UserLoggedIn,
    UserLoggedOut,
    EmailVerified,
    PasswordReset,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub action: AuditAction,
    pub user_id: Uuid,
    pub resource_type: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLog {
    pub fn from_event(event: &AuthEvent) -> Self {
        let (action, details) = match event {
            AuthEvent::Registered { email, .. } => (AuditAction::UserRegistered, Some(email.clone())),
            AuthEvent::Login { revoked_tokens, .. } => (
                AuditAction::UserLoggedIn,
                Some(format!("revoked {} previous tokens", revoked_tokens)),
            ),
            AuthEvent::Logout { revoked_tokens, .. } => (
                AuditAction::UserLoggedOut,
                Some(format!("revoked {} tokens", revoked_tokens)),
            ),
            AuthEvent::Verified { email, .. } => (AuditAction::EmailVerified, Some(email.clone())),
            AuthEvent::PasswordReset { .. } => (AuditAction::PasswordReset, None),
        };

        Self {
            id: Uuid::new_v4(),
            action,
            user_id: event.user_id(),
            resource_type: "user".to_string(),
            details,
            timestamp: Utc::now(),
        }
    }
}

pub struct AuditLogger;

impl AuditLogger {
    /// Write an auth event to the `audit` tracing target as one JSON line
    pub fn log_auth_event(event: &AuthEvent) {
        let audit_log = AuditLog::from_event(event);

        let json_log = serde_json::to_string(&audit_log).unwrap_or_else(|e| {
            warn!("Failed to serialize audit log: {}", e);
            format!("{:?}", audit_log)
        });

        info!(target: "audit", "{}", json_log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_log_from_logout_event() {
        let user_id = Uuid::new_v4();
        let log = AuditLog::from_event(&AuthEvent::Logout {
            user_id,
            revoked_tokens: 2,
        });

        assert_eq!(log.action, AuditAction::UserLoggedOut);
        assert_eq!(log.user_id, user_id);
        assert_eq!(log.details.as_deref(), Some("revoked 2 tokens"));
    }

    #[test]
    fn test_audit_log_serializes() {
        let log = AuditLog::from_event(&AuthEvent::Verified {
            user_id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
        });
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["action"], "EmailVerified");
        assert_eq!(json["resource_type"], "user");
    }
}
