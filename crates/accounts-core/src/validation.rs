//! Input validation and field-level error reporting

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::config::PasswordConfig;
use crate::{Error, Result};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// Upper bound on secrets; keeps a single request from pinning a hashing thread.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Request key for a struct field: `first_name` becomes `firstName`
pub fn wire_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Flatten `validator` output into a stable, sorted list keyed by request
/// field names
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", wire_name(field)));
                FieldError::new(wire_name(field), message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    out
}

/// Run derived validation and convert failures into [`Error::Validation`]
pub fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request
        .validate()
        .map_err(|errors| Error::Validation(field_errors(&errors)))
}

/// Enforce the configured password length bounds
pub fn validate_password(field: &str, password: &str, policy: &PasswordConfig) -> Result<()> {
    let len = password.chars().count();
    if len < policy.min_length {
        return Err(Error::validation(
            field,
            format!("Password must be at least {} characters long", policy.min_length),
        ));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(Error::validation(
            field,
            format!("Password must not exceed {} characters", MAX_PASSWORD_LENGTH),
        ));
    }
    Ok(())
}

/// Validate email format
pub fn validate_email_format(email: &str) -> std::result::Result<(), ValidationError> {
    if EMAIL_REGEX.is_match(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email")
            .with_message(Cow::Borrowed("Please include a valid email")))
    }
}

/// Trimmed value, or `None` when blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
