use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::UserError;
use crate::users::repo_types::{NewUser, User, UserChanges};

/// Query-execution seam for the `users` table.
///
/// Implementations propagate backend failures unchanged, except for a
/// uniqueness conflict on insert, which becomes a validation error.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<User>, UserError>;
    /// Case-insensitive exact match, at most one row.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError>;
    async fn username_exists(&self, username: &str) -> Result<bool, UserError>;
    async fn email_exists(&self, email: &str) -> Result<bool, UserError>;
    async fn insert(&self, user: NewUser) -> Result<User, UserError>;
    /// Returns the updated rows; empty when `id` matches nothing.
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Vec<User>, UserError>;
    /// Returns the number of rows removed.
    async fn delete(&self, id: Uuid) -> Result<u64, UserError>;
}

const USER_COLUMNS: &str = "id, username, name, email, password_hash, created_at, updated_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Map a unique-index violation to the message the pre-checks would give.
fn map_unique_violation(err: sqlx::Error, username: Option<&str>, email: &str) -> UserError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = match (db_err.constraint(), username) {
                (Some(c), Some(username)) if c.contains("username") => {
                    format!("The username \"{username}\" is already in use.")
                }
                _ => format!("The email \"{email}\" is already in use."),
            };
            return UserError::validation(message);
        }
    }
    err.into()
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_all(&self) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users"))
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1) LIMIT 1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, UserError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))"#,
        )
        .bind(username)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, UserError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))"#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, user: NewUser) -> Result<User, UserError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, Some(&user.username), &user.email))?;
        debug!(user_id = %created.id, "user row inserted");
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name = $1, email = $2, password_hash = $3,
                   updated_at = now()
             WHERE id = $4
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, None, &changes.email))?;
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> Result<u64, UserError> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
