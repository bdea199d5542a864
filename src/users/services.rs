use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::UserPolicy;
use crate::error::UserError;
use crate::users::{
    dto::{CreateUserRequest, UpdateUserRequest},
    password::hash_password,
    repo::UserStore,
    repo_types::{NewUser, User, UserChanges},
    validation::{validate_create, validate_email, validate_password},
};

/// User operations on top of a [`UserStore`].
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    policy: UserPolicy,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, policy: UserPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn find_all(&self) -> Result<Vec<User>, UserError> {
        self.store.find_all().await
    }

    #[instrument(skip(self))]
    pub async fn find_one_by_username(&self, username: &str) -> Result<User, UserError> {
        self.store.find_by_username(username).await?.ok_or_else(|| {
            UserError::not_found(
                format!("The username \"{username}\" was not found."),
                "Check that the \"username\" is spelled correctly.",
            )
        })
    }

    /// Validate, normalize, check uniqueness, hash, insert. Each step gates
    /// the next and the insert is last.
    #[instrument(skip_all)]
    pub async fn create(&self, req: CreateUserRequest) -> Result<User, UserError> {
        let valid = validate_create(&req)?;
        let email = valid.email.to_lowercase();

        self.ensure_unique_username(&valid.username).await?;
        self.ensure_unique_email(&email).await?;

        let password_hash = hash_password(&valid.password)?;
        let user = self
            .store
            .insert(NewUser {
                username: valid.username,
                email,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Overwrite name, email and password of `id`. An unknown `id` yields an
    /// empty vector.
    #[instrument(skip(self, req))]
    pub async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> Result<Vec<User>, UserError> {
        let UpdateUserRequest {
            name,
            mut email,
            password,
        } = req;

        if self.policy.validate_on_update {
            validate_email(Some(email.as_str()))?;
            validate_password(Some(password.as_str()))?;
            email = email.to_lowercase();
        }

        let password_hash = hash_password(&password)?;
        let rows = self
            .store
            .update(
                id,
                UserChanges {
                    name,
                    email,
                    password_hash,
                },
            )
            .await?;

        if rows.is_empty() {
            debug!(%id, "update matched no user");
        } else {
            info!(%id, "user updated");
        }
        Ok(rows)
    }

    /// Delete by id and return the number of rows removed (0 or 1).
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> Result<u64, UserError> {
        let deleted = self.store.delete(id).await?;
        info!(%id, deleted, "user delete");
        Ok(deleted)
    }

    async fn ensure_unique_username(&self, username: &str) -> Result<(), UserError> {
        if self.store.username_exists(username).await? {
            return Err(UserError::validation(format!(
                "The username \"{username}\" is already in use."
            )));
        }
        Ok(())
    }

    async fn ensure_unique_email(&self, email: &str) -> Result<(), UserError> {
        if self.store.email_exists(email).await? {
            return Err(UserError::validation(format!(
                "The email \"{email}\" is already in use."
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{memory::InMemoryUserStore, password::verify_password};

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryUserStore::new()), UserPolicy::default())
    }

    fn strict_service() -> UserService {
        UserService::new(
            Arc::new(InMemoryUserStore::new()),
            UserPolicy {
                validate_on_update: true,
            },
        )
    }

    fn create_req(username: &str, email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    fn update_req(name: &str, email: &str, password: &str) -> UpdateUserRequest {
        UpdateUserRequest {
            name: Some(name.into()),
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn create_lowercases_email_and_hashes_password() {
        let svc = service();
        let user = svc
            .create(create_req("alice", "Alice@Example.COM", "longenough1"))
            .await
            .expect("create");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "longenough1");
        assert!(verify_password("longenough1", &user.password_hash).unwrap());

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn create_rejects_invalid_shapes() {
        let svc = service();
        let cases = [
            create_req("al", "a@example.com", "longenough1"),
            create_req(&"a".repeat(31), "a@example.com", "longenough1"),
            create_req("al!ce", "a@example.com", "longenough1"),
            create_req("alice", "not-an-email", "longenough1"),
            create_req("alice", "a@example.com", "short"),
            create_req("alice", "a@example.com", &"x".repeat(73)),
        ];
        for req in cases {
            let err = svc.create(req).await.unwrap_err();
            assert!(err.is_validation(), "{err:?}");
        }
        assert!(svc.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_case_insensitive_username_collision() {
        let svc = service();
        svc.create(create_req("alice", "alice@x.com", "longenough1"))
            .await
            .unwrap();
        let err = svc
            .create(create_req("ALICE", "new@x.com", "longenough1"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "The username \"ALICE\" is already in use.");
        assert_eq!(svc.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_email_collision() {
        let svc = service();
        svc.create(create_req("alice", "alice@x.com", "longenough1"))
            .await
            .unwrap();
        let err = svc
            .create(create_req("bob", "ALICE@X.com", "longenough1"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "The email \"alice@x.com\" is already in use.");
    }

    #[tokio::test]
    async fn find_one_by_username_ignores_case_and_reports_missing() {
        let svc = service();
        let created = svc
            .create(create_req("Alice", "alice@x.com", "longenough1"))
            .await
            .unwrap();
        let found = svc.find_one_by_username("aLICE").await.unwrap();
        assert_eq!(found.id, created.id);

        let err = svc.find_one_by_username("nonexistent").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nonexistent"));
        assert!(err.action().is_some());
    }

    #[tokio::test]
    async fn delete_user_returns_affected_count() {
        let svc = service();
        let user = svc
            .create(create_req("alice", "alice@x.com", "longenough1"))
            .await
            .unwrap();
        assert_eq!(svc.delete_user(Uuid::new_v4()).await.unwrap(), 0);
        assert_eq!(svc.delete_user(user.id).await.unwrap(), 1);
        assert!(svc.find_all().await.unwrap().iter().all(|u| u.id != user.id));
    }

    #[tokio::test]
    async fn update_unknown_id_is_empty_not_error() {
        let svc = service();
        let rows = svc
            .update_user(Uuid::new_v4(), update_req("Alice", "a@x.com", "longenough1"))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn update_overwrites_and_hashes() {
        let svc = service();
        let user = svc
            .create(create_req("alice", "alice@x.com", "longenough1"))
            .await
            .unwrap();
        let rows = svc
            .update_user(user.id, update_req("Alice A.", "alice2@x.com", "anotherpass"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        let updated = &rows[0];
        assert_eq!(updated.name.as_deref(), Some("Alice A."));
        assert_eq!(updated.email, "alice2@x.com");
        assert!(verify_password("anotherpass", &updated.password_hash).unwrap());
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn update_skips_schema_checks_by_default() {
        let svc = service();
        let user = svc
            .create(create_req("alice", "alice@x.com", "longenough1"))
            .await
            .unwrap();
        let rows = svc
            .update_user(user.id, update_req("A", "Not-An-Email", "short"))
            .await
            .unwrap();
        assert_eq!(rows[0].email, "Not-An-Email");
    }

    #[tokio::test]
    async fn update_validates_when_policy_enabled() {
        let svc = strict_service();
        let user = svc
            .create(create_req("alice", "alice@x.com", "longenough1"))
            .await
            .unwrap();
        let err = svc
            .update_user(user.id, update_req("A", "not-an-email", "longenough1"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = svc
            .update_user(user.id, update_req("A", "alice@x.com", "short"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let rows = svc
            .update_user(user.id, update_req("A", "ALICE3@X.com", "longenough1"))
            .await
            .unwrap();
        assert_eq!(rows[0].email, "alice3@x.com");
    }
}
