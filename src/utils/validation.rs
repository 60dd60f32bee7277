// Validation utilities for request fields

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Field name to messages, rendered as the `errors` object of a 400 response
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Collect the messages produced by `validator` derives
    pub fn from_validation(result: Result<(), validator::ValidationErrors>) -> Self {
        let mut errors = Self::new();
        if let Err(validation_errors) = result {
            for (field, field_errors) in validation_errors.field_errors() {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("The {} field is invalid.", field));
                    errors.add(field, message);
                }
            }
        }
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was collected, otherwise a validation error
    pub fn into_result(self) -> Result<(), crate::utils::auth_errors::AuthError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::utils::auth_errors::AuthError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "{}", joined)
    }
}

/// Trim and validate string fields
///
/// # Arguments
/// * `field` - The string field to validate
/// * `required` - Whether the field is required (cannot be empty)
///
/// # Returns
/// * `Ok(String)` - The trimmed string if valid
/// * `Err(String)` - Error message if validation fails
pub fn trim_and_validate_field(field: &str, required: bool) -> Result<String, String> {
    let trimmed = field.trim().to_string();
    if trimmed.is_empty() && required {
        Err("Field cannot be empty".to_string())
    } else {
        Ok(trimmed)
    }
}

/// Emails are unique case-insensitively, so every lookup goes through this
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimum length and confirmation checks shared by register and reset
pub fn check_password(
    errors: &mut FieldErrors,
    password: &str,
    confirmation: &str,
    min_length: usize,
) {
    if password.is_empty() {
        errors.add("password", "The password field is required.");
    } else if password.chars().count() < min_length {
        errors.add(
            "password",
            format!("The password must be at least {} characters.", min_length),
        );
    }

    if password != confirmation {
        errors.add("password", "The password confirmation does not match.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_and_validate_field() {
        assert_eq!(trim_and_validate_field("  Ada  ", true), Ok("Ada".to_string()));
        assert!(trim_and_validate_field("   ", true).is_err());
        assert_eq!(trim_and_validate_field("", false), Ok(String::new()));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_check_password_reports_both_problems() {
        let mut errors = FieldErrors::new();
        check_password(&mut errors, "abc", "abd", 8);
        let messages = errors.get("password").expect("password errors");
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("at least 8"));
        assert!(messages[1].contains("confirmation"));
    }

    #[test]
    fn test_check_password_accepts_matching_password() {
        let mut errors = FieldErrors::new();
        check_password(&mut errors, "pw", "pw", 1);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_display_joins_fields() {
        let mut errors = FieldErrors::new();
        errors.add("email", "The email has already been taken.");
        errors.add("name", "The name field is required.");
        assert_eq!(
            errors.to_string(),
            "email: The email has already been taken., name: The name field is required."
        );
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let errors = FieldErrors::single("email", "bad");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value, serde_json::json!({"email": ["bad"]}));
    }
}
