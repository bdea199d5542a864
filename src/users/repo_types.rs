use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // server-generated
    pub username: String,           // case-insensitively unique
    pub name: Option<String>,       // display name, set by updates
    pub email: String,              // stored lower-cased
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Row to insert, after validation, normalization and hashing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Full replacement of the mutable columns.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
}
