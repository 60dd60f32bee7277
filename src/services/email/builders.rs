// Email Builders - Builders for different types of emails
// Each builder knows how to construct its specific email type

use super::types::{
    EmailBuilder, EmailError, EmailMessage, PasswordResetEmailData, VerificationEmailData,
};
use crate::app_config::EmailConfig;
use crate::services::signed_link::SignedVerificationLink;
use handlebars::Handlebars;
use tracing::instrument;
use url::form_urlencoded;

/// Absolute verification URL for a signed link
pub fn verification_url(frontend_url: &str, link: &SignedVerificationLink) -> String {
    format!("{}{}", frontend_url.trim_end_matches('/'), link.path())
}

/// Frontend page that collects the new password
pub fn password_reset_url(frontend_url: &str, token: &str, email: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("token", token)
        .append_pair("email", email)
        .finish();
    format!("{}/reset-password?{}", frontend_url.trim_end_matches('/'), query)
}

fn sender_address(config: &EmailConfig) -> String {
    format!("{} <{}>", config.from_name, config.from_email)
}

/// Builder for signed-link verification emails
pub struct VerificationEmailBuilder<'a> {
    to_email: &'a str,
    user_name: &'a str,
    verification_url: String,
    expiry_minutes: i64,
    config: &'a EmailConfig,
    templates: &'a Handlebars<'a>,
}

impl<'a> VerificationEmailBuilder<'a> {
    pub fn new(
        to_email: &'a str,
        user_name: &'a str,
        link: &SignedVerificationLink,
        config: &'a EmailConfig,
        templates: &'a Handlebars<'a>,
    ) -> Self {
        let remaining_seconds = link.expires - chrono::Utc::now().timestamp();
        Self {
            to_email,
            user_name,
            verification_url: verification_url(&config.frontend_url, link),
            expiry_minutes: (remaining_seconds / 60).max(1),
            config,
            templates,
        }
    }
}

impl<'a> EmailBuilder for VerificationEmailBuilder<'a> {
    #[instrument(skip(self))]
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let data = VerificationEmailData {
            verification_url: self.verification_url.clone(),
            user_name: self.user_name.to_string(),
            app_name: self.config.from_name.clone(),
            app_url: self.config.frontend_url.clone(),
            support_email: self.config.support_email.clone(),
            expiry_minutes: self.expiry_minutes,
        };

        let html = self
            .templates
            .render("verify_email", &data)
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        let text = format!(
            "Hi {},\n\n\
            Please click the link below to verify your email address:\n\n\
            {}\n\n\
            This link will expire in {} minutes.\n\n\
            If you did not create an account, no further action is required.\n\n\
            Best regards,\n\
            The {} Team",
            self.user_name, self.verification_url, data.expiry_minutes, self.config.from_name
        );

        Ok(EmailMessage::new(
            sender_address(self.config),
            vec![self.to_email.to_string()],
            "Verify Email Address".to_string(),
            html,
        )
        .with_text(text)
        .with_reply_to(self.config.support_email.clone()))
    }
}

/// Builder for password reset emails with secure tokens
pub struct PasswordResetEmailBuilder<'a> {
    to_email: &'a str,
    user_name: &'a str,
    reset_token: &'a str,
    expiry_minutes: i64,
    config: &'a EmailConfig,
    templates: &'a Handlebars<'a>,
}

impl<'a> PasswordResetEmailBuilder<'a> {
    pub fn new(
        to_email: &'a str,
        user_name: &'a str,
        reset_token: &'a str,
        expiry_minutes: i64,
        config: &'a EmailConfig,
        templates: &'a Handlebars<'a>,
    ) -> Self {
        Self {
            to_email,
            user_name,
            reset_token,
            expiry_minutes,
            config,
            templates,
        }
    }
}

impl<'a> EmailBuilder for PasswordResetEmailBuilder<'a> {
    #[instrument(skip(self))]
    fn build(&self) -> Result<EmailMessage, EmailError> {
        let reset_url = password_reset_url(&self.config.frontend_url, self.reset_token, self.to_email);

        let data = PasswordResetEmailData {
            reset_url: reset_url.clone(),
            user_name: self.user_name.to_string(),
            app_name: self.config.from_name.clone(),
            app_url: self.config.frontend_url.clone(),
            support_email: self.config.support_email.clone(),
            expiry_minutes: self.expiry_minutes,
        };

        let html = self
            .templates
            .render("password_reset", &data)
            .map_err(|e| EmailError::TemplateError(e.to_string()))?;

        let text = format!(
            "Hi {},\n\n\
            We received a request to reset your password. Click the link below to set a new password:\n\n\
            {}\n\n\
            This link will expire in {} minutes.\n\n\
            If you didn't request this, please ignore this email. Your password won't be changed.\n\n\
            Best regards,\n\
            The {} Team",
            self.user_name, reset_url, data.expiry_minutes, self.config.from_name
        );

        Ok(EmailMessage::new(
            sender_address(self.config),
            vec![self.to_email.to_string()],
            "Reset Password Notification".to_string(),
            html,
        )
        .with_text(text))
    }
}
