//! Core types for accounts-core

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::password::PasswordHash;
use crate::validation::validate_email_format;

/// Authorization tier carried in every access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }

    /// True if this role is one of `allowed`
    pub fn is_any_of(&self, allowed: &[Role]) -> bool {
        allowed.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(crate::Error::validation("role", format!("unknown role '{}'", other))),
        }
    }
}

/// Registered principal
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "userId")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    pub role: Role,
    pub phone_number: Option<String>,
    #[serde(rename = "isActive")]
    pub active: bool,
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<PasswordHash>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user ID
    pub fn new_id() -> String {
        format!("user_{}", Uuid::new_v4().simple())
    }

    /// Public view of the identity, safe to hand to clients
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            user_id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Identity summary returned on login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

/// Request to register a new user
///
/// `password` is checked against [`crate::config::PasswordConfig`] at
/// registration time rather than here.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(rename = "firstName")]
    #[validate(length(min = 2, max = 50, message = "First name must be between 2 and 50 characters"))]
    pub first_name: String,
    #[serde(rename = "lastName")]
    #[validate(length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters"))]
    pub last_name: String,
    #[validate(custom(function = "validate_email_format"))]
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Login credentials
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "validate_email_format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request to change the caller's password
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(rename = "oldPassword")]
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Request to update the caller's own profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// Record handed to a [`crate::UserStore`] for insertion.
///
/// The secret is already hashed; there is no field for a raw password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub phone_number: Option<String>,
}

/// Trim and lowercase an email so lookups are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
