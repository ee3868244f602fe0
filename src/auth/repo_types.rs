use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;

pub const DEFAULT_PROFILE_IMAGE: &str = "/images/profile.jpg";

/// User record in the credential store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub userid: String,               // unique login id
    pub email: String,                // unique
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    pub gender: String,
    pub birthdate: String,            // second factor for recovery flows
    pub profile_image: String,
    pub is_temporary_password: bool,
    pub created_at: OffsetDateTime,
}

/// Fields supplied at registration; the store stamps `created_at`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub userid: String,
    pub email: String,
    pub password_hash: String,
    pub gender: String,
    pub birthdate: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field (userid or email) is already taken.
    #[error("{0} already registered")]
    Duplicate(&'static str),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
