// Framework-independent auth endpoint
// Owns the token lifecycle; HTTP handlers only translate requests and responses.

use chrono::{Duration, Utc};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{PasswordResetStore, TokenStore, UserStore},
    middleware::auth::AuthenticatedUser,
    models::{
        parse_plain_text_token, AuthToken, ForgotPasswordRequest, LoginRequest, NewUser,
        RegisterRequest, ResetPasswordRequest, User, UserResponse, VerifyEmailQuery,
    },
    services::{
        email::NotificationSender,
        events::{AuthEvent, EventDispatcher},
        password_reset::PasswordBroker,
        signed_link::LinkSigner,
    },
    utils::{
        check_password, normalize_email, trim_and_validate_field, AuthError, FieldErrors,
        PasswordHasher,
    },
};

pub const PASSWORD_RESET_LINK_STATUS: &str =
    "If an account exists for that email, a password reset link has been sent.";
pub const PASSWORD_RESET_STATUS: &str = "Your password has been reset.";
pub const VERIFICATION_LINK_SENT_STATUS: &str = "verification-link-sent";
const INVALID_RESET_TOKEN: &str = "This password reset token is invalid.";

/// Tunables that come from configuration
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub password_min_length: usize,
    pub password_reset_expire: Duration,
    pub password_reset_throttle: Duration,
    pub send_verification_on_register: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            password_min_length: 8,
            password_reset_expire: Duration::minutes(60),
            password_reset_throttle: Duration::seconds(60),
            send_verification_on_register: true,
        }
    }
}

/// Collaborators injected into [`AuthEndpoint`]
#[derive(Clone)]
pub struct AuthDependencies {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub password_resets: Arc<dyn PasswordResetStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub notifier: Arc<dyn NotificationSender>,
    pub signer: LinkSigner,
    pub events: EventDispatcher,
}

pub struct AuthEndpoint {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    hasher: Arc<dyn PasswordHasher>,
    notifier: Arc<dyn NotificationSender>,
    signer: LinkSigner,
    events: EventDispatcher,
    broker: PasswordBroker,
    settings: AuthSettings,
}

impl AuthEndpoint {
    pub fn new(deps: AuthDependencies, settings: AuthSettings) -> Self {
        let broker = PasswordBroker::new(
            deps.password_resets,
            settings.password_reset_expire,
            settings.password_reset_throttle,
        );

        Self {
            users: deps.users,
            tokens: deps.tokens,
            hasher: deps.hasher,
            notifier: deps.notifier,
            signer: deps.signer,
            events: deps.events,
            broker,
            settings,
        }
    }

    /// Create an account. Every invalid field is reported together.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, mut input: RegisterRequest) -> Result<User, AuthError> {
        input.email = normalize_email(&input.email);
        let mut errors = FieldErrors::from_validation(input.validate());

        let name = match trim_and_validate_field(&input.name, true) {
            Ok(name) => name,
            Err(_) => {
                errors.add("name", "The name field is required.");
                String::new()
            },
        };

        check_password(
            &mut errors,
            &input.password,
            &input.password_confirmation,
            self.settings.password_min_length,
        );

        let email = input.email.clone();
        if !errors.contains("email") && self.users.email_exists(&email).await? {
            errors.add("email", "The email has already been taken.");
        }
        errors.into_result()?;

        let password_hash = self.hasher.hash(&input.password)?;
        // A concurrent registration for the same email still surfaces as a validation error
        let user = self
            .users
            .create(NewUser::new(name, email, password_hash))
            .await?;

        info!(user_id = %user.id, "user_registered");
        self.events.dispatch(AuthEvent::Registered {
            user_id: user.id,
            email: user.email.clone(),
        });

        if self.settings.send_verification_on_register {
            let link = self.signer.sign_verification(user.id, &user.email);
            if let Err(e) = self.notifier.send_email_verification(&user, &link).await {
                warn!(user_id = %user.id, error = %e, "Verification email after registration failed");
            }
        }

        Ok(user)
    }

    /// Check credentials, revoke every previous token and return the new plain-text token
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, mut input: LoginRequest) -> Result<String, AuthError> {
        input.email = normalize_email(&input.email);
        FieldErrors::from_validation(input.validate()).into_result()?;

        let email = input.email.clone();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(&input.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.rehash_if_needed(&user, &input.password).await;

        let issued = AuthToken::issue(user.id, AuthToken::login_name(user.id));
        let revoked_tokens = self.tokens.rotate(user.id, issued.token).await?;

        info!(user_id = %user.id, revoked_tokens, "user_logged_in");
        self.events.dispatch(AuthEvent::Login {
            user_id: user.id,
            revoked_tokens,
        });

        Ok(issued.plain_text_token)
    }

    async fn rehash_if_needed(&self, user: &User, password: &str) {
        match self.hasher.needs_rehash(&user.password_hash) {
            Ok(true) => {
                let result = match self.hasher.hash(password) {
                    Ok(hash) => self
                        .users
                        .update_password(user.id, hash)
                        .await
                        .map_err(AuthError::from),
                    Err(e) => Err(e.into()),
                };
                match result {
                    Ok(()) => debug!(user_id = %user.id, "Password hash upgraded"),
                    Err(e) => warn!(user_id = %user.id, error = %e, "Password rehash failed"),
                }
            },
            Ok(false) => {},
            Err(e) => warn!(user_id = %user.id, error = %e, "Could not inspect password hash"),
        }
    }

    /// Resolve a bearer token to its user
    pub async fn authenticate(&self, bearer: &str) -> Result<AuthenticatedUser, AuthError> {
        let (token_id, secret) =
            parse_plain_text_token(bearer).ok_or(AuthError::Unauthenticated)?;

        let token = self
            .tokens
            .find_by_id(token_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if !token.matches(secret) {
            debug!(token_id = %token_id, "Bearer secret mismatch");
            return Err(AuthError::Unauthenticated);
        }

        let user = self
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        self.tokens.touch(token.id, Utc::now()).await?;

        Ok(AuthenticatedUser {
            user,
            token_id: token.id,
        })
    }

    /// Revoke every token the current user holds
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id()))]
    pub async fn logout(&self, auth: &AuthenticatedUser) -> Result<usize, AuthError> {
        let revoked_tokens = self.tokens.revoke_all(auth.user_id()).await?;

        info!(revoked_tokens, "user_logged_out");
        self.events.dispatch(AuthEvent::Logout {
            user_id: auth.user_id(),
            revoked_tokens,
        });

        Ok(revoked_tokens)
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id()))]
    pub async fn send_email_verification(&self, auth: &AuthenticatedUser) -> Result<(), AuthError> {
        if auth.user.has_verified_email() {
            return Err(AuthError::AlreadyVerified);
        }

        let link = self.signer.sign_verification(auth.user_id(), auth.email());
        self.notifier
            .send_email_verification(&auth.user, &link)
            .await?;

        info!("verification_link_sent");
        Ok(())
    }

    /// Consume a signed verification link for the authenticated user
    #[instrument(skip(self, auth, hash, query), fields(user_id = %auth.user_id()))]
    pub async fn verify_email(
        &self,
        auth: &AuthenticatedUser,
        id: &str,
        hash: &str,
        query: &VerifyEmailQuery,
    ) -> Result<(), AuthError> {
        // Reported before the link is even looked at
        if auth.user.has_verified_email() {
            return Err(AuthError::AlreadyVerified);
        }

        let link_user_id = Uuid::parse_str(id).map_err(|_| AuthError::InvalidLink)?;
        let expires = query
            .expires
            .as_deref()
            .and_then(|e| e.parse::<i64>().ok())
            .ok_or(AuthError::InvalidLink)?;
        let signature = query.signature.as_deref().ok_or(AuthError::InvalidLink)?;

        self.signer
            .verify(link_user_id, hash, expires, signature, Utc::now())
            .map_err(|e| {
                debug!(error = %e, "Verification link rejected");
                AuthError::InvalidLink
            })?;

        if link_user_id != auth.user_id() {
            debug!(link_user_id = %link_user_id, "Verification link belongs to another user");
            return Err(AuthError::InvalidLink);
        }

        let expected = LinkSigner::email_hash(auth.email());
        if !bool::from(expected.as_bytes().ct_eq(hash.as_bytes())) {
            debug!("Verification link hash does not match current email");
            return Err(AuthError::InvalidLink);
        }

        if self
            .users
            .mark_email_verified(auth.user_id(), Utc::now())
            .await?
        {
            info!("email_verified");
            self.events.dispatch(AuthEvent::Verified {
                user_id: auth.user_id(),
                email: auth.email().to_string(),
            });
        }

        Ok(())
    }

    /// Always succeeds for a well-formed email so callers cannot tell which emails have accounts
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn forgot_password(&self, mut input: ForgotPasswordRequest) -> Result<(), AuthError> {
        input.email = normalize_email(&input.email);
        FieldErrors::from_validation(input.validate()).into_result()?;

        let email = input.email.clone();
        let Some(user) = self.users.find_by_email(&email).await? else {
            info!("Password reset requested for unknown email");
            return Ok(());
        };

        let Some(token) = self.broker.create_token(&user.email, Utc::now()).await? else {
            return Ok(());
        };

        if let Err(e) = self.notifier.send_password_reset(&user, &token).await {
            warn!(user_id = %user.id, error = %e, "Password reset email failed");
        }

        Ok(())
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn reset_password(&self, mut input: ResetPasswordRequest) -> Result<(), AuthError> {
        input.email = normalize_email(&input.email);
        let mut errors = FieldErrors::from_validation(input.validate());
        check_password(
            &mut errors,
            &input.password,
            &input.password_confirmation,
            self.settings.password_min_length,
        );
        errors.into_result()?;

        let email = input.email.clone();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AuthError::field("email", INVALID_RESET_TOKEN))?;

        if !self
            .broker
            .validate(&user.email, &input.token, Utc::now())
            .await?
        {
            return Err(AuthError::field("email", INVALID_RESET_TOKEN));
        }

        let password_hash = self.hasher.hash(&input.password)?;
        self.users.update_password(user.id, password_hash).await?;
        let revoked_tokens = self.tokens.revoke_all(user.id).await?;
        self.broker.delete(&user.email).await?;

        info!(user_id = %user.id, revoked_tokens, "password_reset");
        self.events
            .dispatch(AuthEvent::PasswordReset { user_id: user.id });

        Ok(())
    }

    pub fn current_user(&self, auth: &AuthenticatedUser) -> UserResponse {
        UserResponse::from(auth.user.clone())
    }

    /// Maintenance hook for the background task
    pub async fn purge_expired_password_resets(&self) -> Result<usize, AuthError> {
        Ok(self.broker.purge_expired(Utc::now()).await?)
    }
}
