// Email notifications for verification links and password resets

pub mod builders;
pub mod sender;
pub mod types;

use self::types::EmailBuilder;
use crate::app_config::EmailConfig;
use crate::models::User;
use crate::services::signed_link::SignedVerificationLink;
use async_trait::async_trait;
use builders::{PasswordResetEmailBuilder, VerificationEmailBuilder};
use handlebars::Handlebars;
use sender::EmailSender;
use std::sync::Arc;
use tracing::{info, instrument};

pub use types::{EmailError, EmailMessage};

/// Delivery seam for the two notifications the auth flow sends
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_email_verification(
        &self,
        user: &User,
        link: &SignedVerificationLink,
    ) -> Result<(), EmailError>;

    async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), EmailError>;
}

/// Renders Handlebars templates and sends through Resend
#[derive(Clone)]
pub struct EmailService {
    sender: EmailSender,
    config: EmailConfig,
    templates: Arc<Handlebars<'static>>,
    reset_expiry_minutes: i64,
}

impl EmailService {
    pub fn new(config: EmailConfig, reset_expiry_minutes: i64) -> Result<Self, EmailError> {
        if config.resend_api_key.is_empty() {
            return Err(EmailError::ConfigError(
                "RESEND_API_KEY is required for the resend provider".to_string(),
            ));
        }

        let mut templates = Handlebars::new();
        Self::register_templates(&mut templates)?;

        let sender =
            EmailSender::new_resend(config.resend_api_key.clone(), config.resend_api_url.clone())
                .with_max_retries(3)
                .with_retry_delay(std::time::Duration::from_secs(1));

        Ok(Self {
            sender,
            config,
            templates: Arc::new(templates),
            reset_expiry_minutes,
        })
    }

    fn register_templates(templates: &mut Handlebars) -> Result<(), EmailError> {
        templates
            .register_template_string(
                "verify_email",
                include_str!("../../templates/email/verify_email.html"),
            )
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        templates
            .register_template_string(
                "password_reset",
                include_str!("../../templates/email/password_reset.html"),
            )
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        Ok(())
    }

    fn verification_message(
        &self,
        user: &User,
        link: &SignedVerificationLink,
    ) -> Result<EmailMessage, EmailError> {
        VerificationEmailBuilder::new(&user.email, &user.name, link, &self.config, &self.templates)
            .build()
    }

    fn password_reset_message(&self, user: &User, token: &str) -> Result<EmailMessage, EmailError> {
        PasswordResetEmailBuilder::new(
            &user.email,
            &user.name,
            token,
            self.reset_expiry_minutes,
            &self.config,
            &self.templates,
        )
        .build()
    }
}

#[async_trait]
impl NotificationSender for EmailService {
    #[instrument(skip(self, user, link), fields(user_id = %user.id))]
    async fn send_email_verification(
        &self,
        user: &User,
        link: &SignedVerificationLink,
    ) -> Result<(), EmailError> {
        info!("Sending verification email to {}", user.email);
        let message = self.verification_message(user, link)?;
        self.sender.send_with_retry(message).await
    }

    #[instrument(skip(self, user, token), fields(user_id = %user.id))]
    async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), EmailError> {
        info!("Sending password reset email to {}", user.email);
        let message = self.password_reset_message(user, token)?;
        self.sender.send_with_retry(message).await
    }
}

/// Development sender that only logs the URLs it would have mailed
#[derive(Clone)]
pub struct LogNotificationSender {
    frontend_url: String,
}

impl LogNotificationSender {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
        }
    }
}

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send_email_verification(
        &self,
        user: &User,
        link: &SignedVerificationLink,
    ) -> Result<(), EmailError> {
        info!(
            user_id = %user.id,
            email = %user.email,
            url = %builders::verification_url(&self.frontend_url, link),
            "Verification email (log provider)"
        );
        Ok(())
    }

    async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), EmailError> {
        info!(
            user_id = %user.id,
            email = %user.email,
            url = %builders::password_reset_url(&self.frontend_url, token, &user.email),
            "Password reset email (log provider)"
        );
        Ok(())
    }
}
