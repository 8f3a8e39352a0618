//! Session authority: token issuance, verification and revocation
//!
//! Session state is never stored as such. It is reconstructed per request
//! from the presented tokens and the single refresh-token hash kept on the
//! identity record, and surfaced as [`SessionState`].

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::credentials::CredentialStore;
use crate::jwt::JwtIssuer;
use crate::types::{ChangePasswordRequest, CreateUserRequest, Role, User, UserSummary};
use crate::validation::validate_request;
use crate::{Error, Result};

/// Identity proven by a valid access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    /// Fails with [`Error::Forbidden`] unless the role is in `allowed`
    pub fn require_role(&self, allowed: &[Role]) -> Result<()> {
        if self.role.is_any_of(allowed) {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "role '{}' is not permitted to perform this action",
                self.role
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Where a caller stands, given whatever tokens it presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No usable token
    Anonymous,
    /// Valid access token
    Authenticated(Principal),
    /// No valid access token, but a refresh token matching the stored hash
    Refreshable { user_id: String },
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    #[serde(skip_serializing)]
    pub expires_in: Duration,
    pub user: UserSummary,
}

/// Result of a successful refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResult {
    pub access_token: String,
    #[serde(skip_serializing)]
    pub expires_in: Duration,
}

/// Token lifecycle state machine
#[derive(Clone)]
pub struct SessionAuthority {
    credentials: CredentialStore,
    jwt: JwtIssuer,
}

impl SessionAuthority {
    pub fn new(credentials: CredentialStore, jwt: JwtIssuer) -> Self {
        Self { credentials, jwt }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn jwt_issuer(&self) -> &JwtIssuer {
        &self.jwt
    }

    /// Register a new identity and return its public summary
    pub async fn register(&self, request: CreateUserRequest) -> Result<UserSummary> {
        let user = self.credentials.create(request).await?;
        Ok(user.summary())
    }

    /// Verify credentials and mint a token pair.
    ///
    /// Unknown email and wrong password fail with the same
    /// [`Error::InvalidCredentials`] after the same hashing work.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult> {
        let user = self.credentials.find_by_email(email).await?;
        let verified = self.credentials.verify_secret(user.as_ref(), password).await?;

        let user = match user {
            Some(user) if verified => user,
            _ => {
                warn!("Rejected login attempt");
                return Err(Error::InvalidCredentials);
            }
        };

        let access_token = self.jwt.create_access_token(&user)?;
        let refresh_token = self.jwt.create_refresh_token(&user.id)?;

        // Overwrites whatever hash was there; an older refresh token stops
        // matching from this point on.
        let refresh_hash = self.credentials.hash_token(&refresh_token).await?;
        self.credentials
            .set_refresh_token_hash(&user.id, Some(&refresh_hash))
            .await?;

        info!("User {} logged in", user.id);

        Ok(LoginResult {
            access_token,
            refresh_token,
            expires_in: Duration::from_secs(self.jwt.config().access_ttl_seconds),
            user: user.summary(),
        })
    }

    /// Mint a new access token from a refresh token.
    ///
    /// The refresh token itself is not rotated and the stored hash is left
    /// as is.
    pub async fn refresh(&self, presented: Option<&str>) -> Result<RefreshResult> {
        let token = match presented.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return Err(Error::MissingToken),
        };

        let user = self.verify_refresh_token(token).await?;
        let access_token = self.jwt.create_access_token(&user)?;
        debug!("Issued refreshed access token for {}", user.id);

        Ok(RefreshResult {
            access_token,
            expires_in: Duration::from_secs(self.jwt.config().access_ttl_seconds),
        })
    }

    /// Clear the stored refresh-token hash. Idempotent; an unknown identity
    /// counts as already logged out.
    pub async fn logout(&self, user_id: &str) -> Result<()> {
        let found = self.credentials.set_refresh_token_hash(user_id, None).await?;
        if found {
            info!("User {} logged out", user_id);
        } else {
            debug!("Logout for unknown user {}", user_id);
        }
        Ok(())
    }

    /// Stateless signature and expiry check
    pub fn verify_access_token(&self, token: &str) -> Result<Principal> {
        let claims = self.jwt.validate_access_token(token)?;
        Ok(Principal {
            user_id: claims.sub,
            role: claims.role,
        })
    }

    /// Classify a caller from whatever tokens it presented
    pub async fn session_state(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<SessionState> {
        if let Some(token) = access_token {
            if let Ok(principal) = self.verify_access_token(token) {
                return Ok(SessionState::Authenticated(principal));
            }
        }

        if let Some(token) = refresh_token {
            match self.verify_refresh_token(token).await {
                Ok(user) => return Ok(SessionState::Refreshable { user_id: user.id }),
                Err(Error::InvalidToken(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(SessionState::Anonymous)
    }

    /// Change the caller's password after re-checking the current one
    pub async fn change_password(&self, user_id: &str, request: ChangePasswordRequest) -> Result<()> {
        validate_request(&request)?;

        let user = self.credentials.find_by_id(user_id).await?;
        let verified = self
            .credentials
            .verify_secret(user.as_ref(), &request.old_password)
            .await?;
        if !verified {
            return Err(Error::IncorrectPassword);
        }

        self.credentials.change_secret(user_id, &request.new_password).await
    }

    async fn verify_refresh_token(&self, token: &str) -> Result<User> {
        let claims = self.jwt.validate_refresh_token(token).map_err(|e| {
            warn!("Refresh token failed verification");
            e
        })?;

        let user = self
            .credentials
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| Error::invalid_token("unknown subject"))?;

        if user.refresh_token_hash.is_none() {
            warn!("Refresh token presented for {} with no active session", user.id);
            return Err(Error::invalid_token("no active session"));
        }

        let matches = self
            .credentials
            .hasher()
            .verify(token, user.refresh_token_hash.as_ref())
            .await?;
        if !matches {
            warn!("Superseded or revoked refresh token presented for {}", user.id);
            return Err(Error::invalid_token("refresh token does not match current session"));
        }

        Ok(user)
    }
}
