//! JWT token issuance and verification

use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::{Error, Result, Role, User};

/// JWT issuer
///
/// Access and refresh tokens are signed with separate secrets so one can
/// never be replayed as the other.
#[derive(Clone)]
pub struct JwtIssuer {
    pub(crate) config: JwtConfig,
    access_keys: Arc<KeyPair>,
    refresh_keys: Arc<KeyPair>,
    header: Header,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub sub: String, // User ID
    pub role: Role,
    pub exp: u64,
    pub iat: u64,
    pub jti: String,
}

/// Refresh token claims (minimal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub iss: String,
    pub sub: String, // User ID
    pub jti: String, // Keeps two tokens minted in the same second distinct
    pub exp: u64,
    pub iat: u64,
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_ttl_seconds: u64,
    pub refresh_ttl_seconds: u64,
    pub access_secret: Option<String>,
    pub refresh_secret: Option<String>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: "shopfront".to_string(),
            access_ttl_seconds: 900,          // 15 minutes
            refresh_ttl_seconds: 604800,      // 7 days
            access_secret: None,
            refresh_secret: None,
        }
    }
}

impl JwtIssuer {
    pub fn new(mut config: JwtConfig) -> Result<Self> {
        if config.access_ttl_seconds == 0 || config.refresh_ttl_seconds == 0 {
            return Err(Error::Config("token TTLs must be positive".to_string()));
        }

        let access_secret = config
            .access_secret
            .get_or_insert_with(|| ephemeral_secret("access"))
            .clone();
        let refresh_secret = config
            .refresh_secret
            .get_or_insert_with(|| ephemeral_secret("refresh"))
            .clone();

        if access_secret.is_empty() || refresh_secret.is_empty() {
            return Err(Error::Config("signing secrets must not be empty".to_string()));
        }
        if access_secret == refresh_secret {
            return Err(Error::Config(
                "access and refresh tokens must use different secrets".to_string(),
            ));
        }

        Ok(Self {
            config,
            access_keys: Arc::new(KeyPair::from_secret(&access_secret)),
            refresh_keys: Arc::new(KeyPair::from_secret(&refresh_secret)),
            header: Header::new(Algorithm::HS256),
        })
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn create_access_token(&self, user: &User) -> Result<String> {
        let (iat, exp) = self.window(self.config.access_ttl_seconds);

        let claims = AccessClaims {
            iss: self.config.issuer.clone(),
            sub: user.id.clone(),
            role: user.role,
            exp,
            iat,
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(&self.header, &claims, &self.access_keys.encoding)?)
    }

    pub fn create_refresh_token(&self, user_id: &str) -> Result<String> {
        let (iat, exp) = self.window(self.config.refresh_ttl_seconds);

        let claims = RefreshTokenClaims {
            iss: self.config.issuer.clone(),
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp,
            iat,
        };

        Ok(encode(&self.header, &claims, &self.refresh_keys.encoding)?)
    }

    /// Signature, issuer and expiry check. No storage access.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims> {
        decode::<AccessClaims>(token, &self.access_keys.decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| Error::invalid_token(e.to_string()))
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims> {
        decode::<RefreshTokenClaims>(token, &self.refresh_keys.decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| Error::invalid_token(e.to_string()))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.header.alg);
        validation.set_issuer(&[self.config.issuer.clone()]);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation
    }

    fn window(&self, ttl_seconds: u64) -> (u64, u64) {
        let now = chrono::Utc::now().timestamp() as u64;
        (now, now + ttl_seconds)
    }
}

fn ephemeral_secret(kind: &str) -> String {
    warn!(
        "No {} token secret configured; generated an ephemeral one. Tokens will not survive a restart.",
        kind
    );
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
