use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_NAME_LEN: usize = 120;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed, lowercased form used for storage and lookup.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "invalid email"));
    }
}

fn check_new_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    /// Normalizes name and email in place and reports every failed field.
    pub fn validate(&mut self) -> Vec<FieldError> {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);

        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push(FieldError::new("name", "name is required"));
        } else if self.name.chars().count() > MAX_NAME_LEN {
            errors.push(FieldError::new(
                "name",
                format!("name must be at most {MAX_NAME_LEN} characters"),
            ));
        }
        check_email(&self.email, &mut errors);
        check_new_password(&self.password, &mut errors);
        errors
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&mut self) -> Vec<FieldError> {
        self.email = normalize_email(&self.email);

        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "password is required"));
        }
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

impl ForgotPasswordRequest {
    pub fn validate(&mut self) -> Vec<FieldError> {
        self.email = normalize_email(&self.email);

        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&mut self) -> Vec<FieldError> {
        self.token = self.token.trim().to_string();

        let mut errors = Vec::new();
        if self.token.is_empty() {
            errors.push(FieldError::new("token", "token is required"));
        }
        check_new_password(&self.password, &mut errors);
        errors
    }
}

/// Returned after register or login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    /// Plaintext reset token; only present when the demo shortcut is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            token: None,
        }
    }
}
