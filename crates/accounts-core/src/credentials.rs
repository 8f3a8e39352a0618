//! Credential store: identity records and secret verification
//!
//! The only way to persist a secret is through [`CredentialStore::create`] or
//! [`CredentialStore::change_secret`], both of which hash first.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::PasswordConfig;
use crate::password::{PasswordHash, PasswordHasher};
use crate::types::{normalize_email, CreateUserRequest, NewUser, UpdateProfileRequest, User};
use crate::user_store::{ProfileUpdate, UserStore};
use crate::validation::{non_blank, validate_password, validate_request};
use crate::{Error, Result};

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    policy: PasswordConfig,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn UserStore>, policy: PasswordConfig) -> Result<Self> {
        let hasher = PasswordHasher::new(&policy)?;
        Ok(Self {
            store,
            hasher,
            policy,
        })
    }

    pub fn user_store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Register a new identity with a freshly salted secret hash
    pub async fn create(&self, request: CreateUserRequest) -> Result<User> {
        self.create_with_id(User::new_id(), request).await
    }

    /// Same as [`Self::create`] with a caller-chosen identifier
    pub async fn create_with_id(&self, id: String, request: CreateUserRequest) -> Result<User> {
        // A taken email wins over every other problem with the request
        let email = normalize_email(&request.email);
        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(Error::UserAlreadyExists(email));
        }

        validate_request(&request)?;
        validate_password("password", &request.password, &self.policy)?;

        let password_hash = self.hasher.hash(&request.password).await?;
        let user = self
            .store
            .create_user(NewUser {
                id,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                email,
                password_hash,
                role: request.role.unwrap_or_default(),
                phone_number: None,
            })
            .await?;

        info!("Registered user {} with role {}", user.id, user.role);
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.store.get_user_by_email(&normalize_email(email)).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.store.get_user(id).await
    }

    /// Constant-cost check of `raw` against the identity's stored hash.
    ///
    /// Passing `None` burns the same hashing time and returns `false`.
    pub async fn verify_secret(&self, user: Option<&User>, raw: &str) -> Result<bool> {
        self.hasher
            .verify(raw, user.map(|u| &u.password_hash))
            .await
    }

    /// Hash an arbitrary token with the secret hasher
    pub async fn hash_token(&self, token: &str) -> Result<PasswordHash> {
        self.hasher.hash(token).await
    }

    /// Persist or clear the single current refresh-token hash
    pub async fn set_refresh_token_hash(
        &self,
        user_id: &str,
        hash: Option<&PasswordHash>,
    ) -> Result<bool> {
        let updated = self.store.set_refresh_token_hash(user_id, hash).await?;
        debug!(
            "Refresh token hash for {} {}",
            user_id,
            if hash.is_some() { "replaced" } else { "cleared" }
        );
        Ok(updated)
    }

    /// Re-hash and persist a new secret. The current refresh token is left
    /// untouched.
    pub async fn change_secret(&self, user_id: &str, new_raw: &str) -> Result<()> {
        validate_password("newPassword", new_raw, &self.policy)?;
        let hash = self.hasher.hash(new_raw).await?;
        self.store.set_password_hash(user_id, &hash).await?;
        info!("Password changed for user {}", user_id);
        Ok(())
    }

    /// Update name and phone fields; blank values keep the stored ones
    pub async fn update_profile(&self, user_id: &str, request: UpdateProfileRequest) -> Result<User> {
        let update = ProfileUpdate {
            first_name: non_blank(request.first_name.as_deref()),
            last_name: non_blank(request.last_name.as_deref()),
            phone_number: non_blank(request.phone_number.as_deref()),
        };

        let mut problems = Vec::new();
        for (field, value) in [("firstName", &update.first_name), ("lastName", &update.last_name)] {
            if let Some(v) = value {
                let len = v.chars().count();
                if !(2..=50).contains(&len) {
                    problems.push(crate::validation::FieldError::new(
                        field,
                        format!("{} must be between 2 and 50 characters", field),
                    ));
                }
            }
        }
        if !problems.is_empty() {
            return Err(Error::Validation(problems));
        }

        self.store.update_profile(user_id, update).await
    }
}
