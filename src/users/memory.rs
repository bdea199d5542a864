use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::UserError;
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, User, UserChanges};

/// In-process store with the same contract as the Postgres one, including
/// the case-insensitive unique indexes. Used by tests and `AppState::fake`.
#[derive(Default)]
pub struct InMemoryUserStore {
    rows: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self.rows.read().await.clone())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|u| same(&u.username, username)).cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, UserError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().any(|u| same(&u.username, username)))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, UserError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().any(|u| same(&u.email, email)))
    }

    async fn insert(&self, user: NewUser) -> Result<User, UserError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|u| same(&u.username, &user.username)) {
            return Err(UserError::validation(format!(
                "The username \"{}\" is already in use.",
                user.username
            )));
        }
        if rows.iter().any(|u| same(&u.email, &user.email)) {
            return Err(UserError::validation(format!(
                "The email \"{}\" is already in use.",
                user.email
            )));
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            name: None,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Vec<User>, UserError> {
        let mut rows = self.rows.write().await;
        let Some(index) = rows.iter().position(|u| u.id == id) else {
            return Ok(Vec::new());
        };
        if rows.iter().any(|u| u.id != id && same(&u.email, &changes.email)) {
            return Err(UserError::validation(format!(
                "The email \"{}\" is already in use.",
                changes.email
            )));
        }
        let row = &mut rows[index];
        row.name = changes.name;
        row.email = changes.email;
        row.password_hash = changes.password_hash;
        row.updated_at = OffsetDateTime::now_utc();
        Ok(vec![row.clone()])
    }

    async fn delete(&self, id: Uuid) -> Result<u64, UserError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|u| u.id != id);
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn insert_enforces_case_insensitive_uniqueness() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("alice", "alice@example.com")).await.unwrap();

        let err = store
            .insert(new_user("ALICE", "other@example.com"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = store
            .insert(new_user("bob", "ALICE@example.com"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("email"));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lookups_ignore_case() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("Alice", "alice@example.com")).await.unwrap();
        assert!(store.username_exists("aLiCe").await.unwrap());
        assert!(store.email_exists("ALICE@EXAMPLE.COM").await.unwrap());
        assert!(store.find_by_username("ALICE").await.unwrap().is_some());
        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_and_delete_report_affected_rows() {
        let store = InMemoryUserStore::new();
        let user = store.insert(new_user("alice", "alice@example.com")).await.unwrap();

        let changes = UserChanges {
            name: Some("Alice".into()),
            email: "new@example.com".into(),
            password_hash: "other".into(),
        };
        assert!(store.update(Uuid::new_v4(), changes.clone()).await.unwrap().is_empty());
        let updated = store.update(user.id, changes).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].name.as_deref(), Some("Alice"));
        assert!(updated[0].updated_at >= user.updated_at);

        assert_eq!(store.delete(Uuid::new_v4()).await.unwrap(), 0);
        assert_eq!(store.delete(user.id).await.unwrap(), 1);
        assert!(store.find_all().await.unwrap().is_empty());
    }
}
