// Auth lifecycle events and the synchronous dispatcher that fans them out

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::utils::audit_logger::AuditLogger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    Registered { user_id: Uuid, email: String },
    Login { user_id: Uuid, revoked_tokens: usize },
    Logout { user_id: Uuid, revoked_tokens: usize },
    Verified { user_id: Uuid, email: String },
    PasswordReset { user_id: Uuid },
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::Registered { .. } => "registered",
            AuthEvent::Login { .. } => "login",
            AuthEvent::Logout { .. } => "logout",
            AuthEvent::Verified { .. } => "verified",
            AuthEvent::PasswordReset { .. } => "password_reset",
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            AuthEvent::Registered { user_id, .. }
            | AuthEvent::Login { user_id, .. }
            | AuthEvent::Logout { user_id, .. }
            | AuthEvent::Verified { user_id, .. }
            | AuthEvent::PasswordReset { user_id } => *user_id,
        }
    }
}

/// Receives every dispatched event. Runs inline on the request task, so keep it cheap.
pub trait AuthEventListener: Send + Sync {
    fn handle(&self, event: &AuthEvent);
}

/// Ordered list of listeners invoked after the state change they describe
#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: Vec<Arc<dyn AuthEventListener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(mut self, listener: Arc<dyn AuthEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn listen(&mut self, listener: Arc<dyn AuthEventListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn dispatch(&self, event: AuthEvent) {
        debug!(
            event = event.name(),
            user_id = %event.user_id(),
            listeners = self.listeners.len(),
            "Dispatching auth event"
        );
        for listener in &self.listeners {
            listener.handle(&event);
        }
    }
}

/// Writes every event to the audit log target
pub struct AuditLogListener;

impl AuthEventListener for AuditLogListener {
    fn handle(&self, event: &AuthEvent) {
        AuditLogger::log_auth_event(event);
    }
}
