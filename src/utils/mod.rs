// Utility modules for the auth service

pub mod audit_logger;
pub mod auth_errors;
pub mod password;
pub mod validation;

pub use audit_logger::{AuditAction, AuditLog, AuditLogger};
pub use auth_errors::{log_auth_failure, AuthError, AuthErrorResponse};
pub use password::{
    hash_password_with_config, verify_password, Argon2Hasher, PasswordConfig, PasswordError,
    PasswordHasher,
};
pub use validation::{
    check_password, normalize_email, trim_and_validate_field, FieldErrors,
};
