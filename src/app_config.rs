// Centralized configuration management
// Load ALL env vars ONCE at startup and pass the result around explicitly

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::services::auth::AuthSettings;
use crate::utils::PasswordConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub rate_limit: RateLimitConfig,
    pub cors_allowed_origins: Vec<String>,
    pub maintenance_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub environment: Environment,
    pub rust_log: String,
}

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" | "local" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Secrets and hashing cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HMAC key for signed verification links
    #[serde(skip_serializing)]
    pub app_key: String,
    pub argon2_memory_cost: u32,
    pub argon2_time_cost: u32,
    pub argon2_parallelism: u32,
}

/// Auth flow tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub password_min_length: usize,
    pub verification_expire_minutes: i64,
    pub password_reset_expire_minutes: i64,
    pub password_reset_throttle_seconds: i64,
    pub send_verification_on_register: bool,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub provider: EmailProvider,
    #[serde(skip_serializing)]
    pub resend_api_key: String,
    pub resend_api_url: String,
    pub from_email: String,
    pub from_name: String,
    pub support_email: String,
    /// Base URL that verification and reset links point at
    pub frontend_url: String,
}

/// Email provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EmailProvider {
    Resend,
    Log,
}

impl From<String> for EmailProvider {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "resend" => EmailProvider::Resend,
            _ => EmailProvider::Log,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub verification_notification_per_minute: u32,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let get_required = |key: &str| -> Result<String, ConfigError> {
            env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
        };

        let get_or_default = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let parse_u32_or_default = |key: &str, default: &str| -> Result<u32, ConfigError> {
            get_or_default(key, default).parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid u32".to_string())
            })
        };

        let parse_i64_or_default = |key: &str, default: &str| -> Result<i64, ConfigError> {
            let value: i64 = get_or_default(key, default).parse().map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "not a valid integer".to_string())
            })?;
            if value < 0 {
                return Err(ConfigError::InvalidValue(
                    key.to_string(),
                    "must not be negative".to_string(),
                ));
            }
            Ok(value)
        };

        let parse_bool_or_default = |key: &str, default: &str| -> bool {
            matches!(
                get_or_default(key, default).to_lowercase().as_str(),
                "true" | "1" | "yes"
            )
        };

        let environment = Environment::from(get_or_default("ENVIRONMENT", "development"));

        let app_key = get_required("APP_KEY")?;
        if app_key.len() < 32 {
            return Err(ConfigError::InvalidValue(
                "APP_KEY".to_string(),
                "Secret must be at least 32 characters long".to_string(),
            ));
        }

        let server = ServerConfig {
            bind_address: get_or_default("BIND_ADDRESS", "0.0.0.0:8080"),
            environment: environment.clone(),
            rust_log: get_or_default("RUST_LOG", "token_auth_service=debug,tower_http=info"),
        };

        let security = SecurityConfig {
            app_key,
            argon2_memory_cost: parse_u32_or_default("ARGON2_MEMORY_COST", "19456")?,
            argon2_time_cost: parse_u32_or_default("ARGON2_TIME_COST", "2")?,
            argon2_parallelism: parse_u32_or_default("ARGON2_PARALLELISM", "1")?,
        };

        let password_min_length = parse_u32_or_default("PASSWORD_MIN_LENGTH", "8")? as usize;
        if password_min_length == 0 {
            return Err(ConfigError::InvalidValue(
                "PASSWORD_MIN_LENGTH".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let auth = AuthConfig {
            password_min_length,
            verification_expire_minutes: parse_i64_or_default("VERIFICATION_EXPIRE_MINUTES", "60")?,
            password_reset_expire_minutes: parse_i64_or_default(
                "PASSWORD_RESET_EXPIRE_MINUTES",
                "60",
            )?,
            password_reset_throttle_seconds: parse_i64_or_default(
                "PASSWORD_RESET_THROTTLE_SECONDS",
                "60",
            )?,
            send_verification_on_register: parse_bool_or_default(
                "SEND_VERIFICATION_ON_REGISTER",
                "true",
            ),
        };

        let provider: EmailProvider = get_or_default("EMAIL_PROVIDER", "log").into();
        let resend_api_key = if provider == EmailProvider::Resend {
            get_required("RESEND_API_KEY")?
        } else {
            get_or_default("RESEND_API_KEY", "")
        };

        // Falls back to a local frontend outside production
        let frontend_url = match env::var("FRONTEND_URL") {
            Ok(url) => url,
            Err(_) if environment == Environment::Production => {
                return Err(ConfigError::MissingVar("FRONTEND_URL".to_string()))
            },
            Err(_) => "http://localhost:3000".to_string(),
        };

        let email = EmailConfig {
            provider,
            resend_api_key,
            resend_api_url: get_or_default("RESEND_API_URL", "https://api.resend.com/emails"),
            from_email: get_or_default("EMAIL_FROM_ADDRESS", "noreply@example.com"),
            from_name: get_or_default("EMAIL_FROM_NAME", "Token Auth"),
            support_email: get_or_default("SUPPORT_EMAIL", "support@example.com"),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        };

        let verification_notification_per_minute =
            parse_u32_or_default("VERIFICATION_NOTIFICATION_PER_MINUTE", "6")?;
        if verification_notification_per_minute == 0 {
            return Err(ConfigError::InvalidValue(
                "VERIFICATION_NOTIFICATION_PER_MINUTE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let cors_allowed_origins: Vec<String> = get_or_default("CORS_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let maintenance_interval_seconds =
            parse_u32_or_default("MAINTENANCE_INTERVAL_SECONDS", "300")?.max(1) as u64;

        Ok(Self {
            server,
            security,
            auth,
            email,
            rate_limit: RateLimitConfig {
                verification_notification_per_minute,
            },
            cors_allowed_origins,
            maintenance_interval_seconds,
        })
    }

    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }

    pub fn password_config(&self) -> PasswordConfig {
        PasswordConfig {
            memory_cost: self.security.argon2_memory_cost,
            time_cost: self.security.argon2_time_cost,
            parallelism: self.security.argon2_parallelism,
            ..PasswordConfig::default()
        }
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            password_min_length: self.auth.password_min_length,
            password_reset_expire: chrono::Duration::minutes(self.auth.password_reset_expire_minutes),
            password_reset_throttle: chrono::Duration::seconds(
                self.auth.password_reset_throttle_seconds,
            ),
            send_verification_on_register: self.auth.send_verification_on_register,
        }
    }
}
