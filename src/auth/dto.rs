use serde::{Deserialize, Serialize};

/// Request body for user registration. Profile fields are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub text_password: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
}

/// Request body for login; `username` is the email.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
