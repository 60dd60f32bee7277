// Request/response bodies for the auth endpoints

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /register`. Password rules depend on runtime config and are checked by the endpoint.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 255, message = "The name may not be greater than 255 characters."))]
    #[serde(default)]
    pub name: String,

    #[validate(
        email(message = "The email must be a valid email address."),
        length(max = 255, message = "The email may not be greater than 255 characters.")
    )]
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    #[serde(default)]
    pub email: String,

    #[validate(length(min = 1, message = "The password field is required."))]
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// Query half of a signed verification link
#[derive(Debug, Default, Deserialize)]
pub struct VerifyEmailQuery {
    pub expires: Option<String>,
    pub signature: Option<String>,
}
