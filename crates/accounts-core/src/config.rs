//! Configuration for accounts-core

use serde::Deserialize;

use crate::jwt::JwtConfig;

/// Main configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

/// Password configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub argon2_memory_cost: u32,
    pub argon2_time_cost: u32,
    pub argon2_parallelism: u32,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://shopfront.db?mode=rwc".to_string(),
            jwt: JwtConfig::default(),
            password: PasswordConfig::default(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // Roughly 20-60ms per hash on commodity hardware.
        Self {
            min_length: 6,
            argon2_memory_cost: 19456,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        }
    }
}

impl PasswordConfig {
    /// Cheap parameters for test suites
    pub fn fast_for_tests() -> Self {
        Self {
            argon2_memory_cost: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..Default::default()
        }
    }
}
