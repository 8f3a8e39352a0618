//! # Accounts-Core
//!
//! Identity storage and the session token lifecycle for Shopfront.
//!
//! This crate provides:
//! - User storage in SQLite
//! - Password hashing with Argon2, offloaded to the blocking pool
//! - Access/refresh JWT issuance, verification and revocation
//! - Input validation with field-level error reporting
//!
//! ## Architecture
//!
//! [`CredentialStore`] owns identity records and secret verification and
//! knows nothing about tokens. [`SessionAuthority`] sits on top of it and
//! issues, verifies and revokes token pairs. The REST layer lives in the
//! `shopfront` crate.

pub mod config;
pub mod credentials;
pub mod error;
pub mod jwt;
pub mod password;
pub mod session;
pub mod types;
pub mod user_store;
pub mod validation;

pub use config::{AccountsConfig, PasswordConfig};
pub use credentials::CredentialStore;
pub use error::{Error, Result};
pub use jwt::{AccessClaims, JwtConfig, JwtIssuer, RefreshTokenClaims};
pub use password::{PasswordHash, PasswordHasher};
pub use session::{LoginResult, Principal, RefreshResult, SessionAuthority, SessionState};
pub use types::{
    ChangePasswordRequest, CreateUserRequest, LoginRequest, Role, UpdateProfileRequest, User,
    UserSummary,
};
pub use user_store::{SqliteUserStore, UserStore};
pub use validation::FieldError;

use std::sync::Arc;

/// Initialize the accounts service on a fresh connection pool
pub async fn init(config: AccountsConfig) -> Result<SessionAuthority> {
    let user_store = SqliteUserStore::new(&config.database_url).await?;
    build(Arc::new(user_store), config)
}

/// Initialize the accounts service on an existing store
pub fn build(user_store: Arc<dyn UserStore>, config: AccountsConfig) -> Result<SessionAuthority> {
    let credentials = CredentialStore::new(user_store, config.password)?;
    let jwt_issuer = JwtIssuer::new(config.jwt)?;
    Ok(SessionAuthority::new(credentials, jwt_issuer))
}
