//! Argon2 hashing for passwords and refresh tokens
//!
//! Hashing is deliberately slow, so every call is moved onto the blocking
//! thread pool instead of running on the request task.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::{PasswordHasher as _, PasswordVerifier, SaltString};
use rand::rngs::OsRng;
use rand::Rng;

use crate::config::PasswordConfig;
use crate::{Error, Result};

/// PHC-format Argon2 hash.
///
/// Only [`PasswordHasher`] and the stores can build one, so nothing can
/// reach persistence with an unhashed secret.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash previously produced by [`PasswordHasher`] and read back
    /// from storage.
    pub(crate) fn from_stored(phc: String) -> Self {
        Self(phc)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Slow one-way hasher with a fresh random salt per record
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Verified against when there is no stored hash so the miss costs the same.
    dummy_hash: PasswordHash,
}

impl PasswordHasher {
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| Error::Config(format!("Invalid argon2 parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let filler: String = OsRng
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let dummy_hash = hash_blocking(&argon2, &filler)?;

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a raw secret
    pub async fn hash(&self, raw: &str) -> Result<PasswordHash> {
        let argon2 = self.argon2.clone();
        let raw = raw.to_owned();
        tokio::task::spawn_blocking(move || hash_blocking(&argon2, &raw)).await?
    }

    /// Check `raw` against `stored`.
    ///
    /// A missing hash still runs a full verification against a dummy hash and
    /// then reports `false`, so callers cannot be timed into revealing which
    /// case they hit.
    pub async fn verify(&self, raw: &str, stored: Option<&PasswordHash>) -> Result<bool> {
        let argon2 = self.argon2.clone();
        let raw = raw.to_owned();
        let present = stored.is_some();
        let target = stored.unwrap_or(&self.dummy_hash).clone();

        let matched =
            tokio::task::spawn_blocking(move || verify_blocking(&argon2, &raw, &target)).await?;
        Ok(present && matched)
    }
}

fn hash_blocking(argon2: &Argon2<'static>, raw: &str) -> Result<PasswordHash> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2.hash_password(raw.as_bytes(), &salt)?;
    Ok(PasswordHash(hash.to_string()))
}

fn verify_blocking(argon2: &Argon2<'static>, raw: &str, stored: &PasswordHash) -> bool {
    match password_hash::PasswordHash::new(stored.as_str()) {
        Ok(parsed) => argon2.verify_password(raw.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(&PasswordConfig::fast_for_tests()).unwrap()
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("abcdef").await.unwrap();

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(hasher.verify("abcdef", Some(&hash)).await.unwrap());
        assert!(!hasher.verify("abcdeg", Some(&hash)).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_secret_gets_distinct_salts() {
        let hasher = fast_hasher();
        let a = hasher.hash("abcdef").await.unwrap();
        let b = hasher.hash("abcdef").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_missing_hash_never_verifies() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("anything", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_garbage_hash_never_verifies() {
        let hasher = fast_hasher();
        let garbage = PasswordHash::from_stored("not-a-phc-string".to_string());
        assert!(!hasher.verify("anything", Some(&garbage)).await.unwrap());
    }

    #[test]
    fn test_debug_redacts_hash() {
        let hash = PasswordHash::from_stored("$argon2id$secret".to_string());
        assert_eq!(format!("{:?}", hash), "PasswordHash(<redacted>)");
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut config = PasswordConfig::fast_for_tests();
        config.argon2_time_cost = 0;
        assert!(matches!(PasswordHasher::new(&config), Err(Error::Config(_))));
    }
}
