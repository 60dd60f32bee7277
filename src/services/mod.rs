// Business logic layer for the auth service

pub mod auth;
pub mod background_tasks;
pub mod email;
pub mod events;
pub mod password_reset;
pub mod signed_link;

// Re-export commonly used services
pub use auth::{AuthDependencies, AuthEndpoint, AuthSettings};
pub use background_tasks::{initialize_background_tasks, BackgroundTaskManager};
pub use email::{EmailError, EmailService, LogNotificationSender, NotificationSender};
pub use events::{AuditLogListener, AuthEvent, AuthEventListener, EventDispatcher};
pub use password_reset::{PasswordBroker, PasswordResetTokenInfo};
pub use signed_link::{LinkError, LinkSigner, SignedVerificationLink};
