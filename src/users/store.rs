//! User Store
//!
//! In-memory account records keyed by generated id. Passwords are hashed
//! with Argon2 before they ever reach the map; plaintext never leaves the
//! register/login/change-password call frames.

use std::collections::HashMap;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::agent::registry::generate_id;
use crate::error::{ApiError, AuthError};

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub flow_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire view of a user; the password hash stays server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            flow_address: user.flow_address.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

pub struct UserStore {
    users: RwLock<HashMap<String, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new account; fails with Conflict when the email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        flow_address: Option<String>,
    ) -> Result<User, ApiError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == email) {
            return Err(ApiError::Conflict("User already exists".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: generate_id("user"),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            flow_address,
            created_at: now,
            updated_at: now,
        };

        users.insert(user.id.clone(), user.clone());
        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Verify credentials and return the account. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let users = self.users.read().await;
        let user = users
            .values()
            .find(|u| u.email == email)
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(user.clone())
    }

    pub async fn get(&self, user_id: &str) -> Option<User> {
        self.users.read().await.get(user_id).cloned()
    }

    /// Update email and/or Flow address; fails with Conflict when the new
    /// email belongs to another account.
    pub async fn update_profile(
        &self,
        user_id: &str,
        email: Option<String>,
        flow_address: Option<Option<String>>,
    ) -> Result<User, ApiError> {
        let mut users = self.users.write().await;

        if let Some(new_email) = &email {
            let taken = users
                .values()
                .any(|u| u.email == *new_email && u.id != user_id);
            if taken {
                return Err(ApiError::Conflict("Email already in use".to_string()));
            }
        }

        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if let Some(new_email) = email {
            user.email = new_email;
        }
        if let Some(new_address) = flow_address {
            user.flow_address = new_address;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    /// Change password after verifying the current one.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(ApiError::Auth(AuthError::InvalidCredentials));
        }

        user.password_hash = hash_password(new_password)?;
        user.updated_at = Utc::now();
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Stored hash is corrupt: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
