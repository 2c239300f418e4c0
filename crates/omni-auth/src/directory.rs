//! User directory.

use async_trait::async_trait;
use omni_cache::{cache_key, Cache};
use omni_commerce::clock::SharedClock;
use omni_commerce::ids::UserId;
use tracing::instrument;

use crate::password::PasswordHasher;
use crate::user::{normalize_email, Role, User, UserRecord};
use crate::AuthError;

/// Id given to the seeded administrator.
pub const ADMIN_USER_ID: &str = "admin-1";

/// Credential check and account creation.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Return the user whose email and password match.
    ///
    /// Fails with [`AuthError::InvalidCredentials`] otherwise.
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Create an account. Fails with [`AuthError::DuplicateAccount`] if the
    /// email is taken.
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError>;

    /// Look up a user by email.
    async fn find(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// All users, oldest registration first.
    async fn list(&self) -> Result<Vec<User>, AuthError>;
}

/// [`UserDirectory`] stored in the key-value store.
#[derive(Clone)]
pub struct KvUserDirectory {
    cache: Cache,
    hasher: PasswordHasher,
    clock: SharedClock,
}

impl std::fmt::Debug for KvUserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvUserDirectory").finish_non_exhaustive()
    }
}

impl KvUserDirectory {
    pub fn new(cache: Cache, clock: SharedClock) -> Self {
        Self {
            cache,
            hasher: PasswordHasher::new(),
            clock,
        }
    }

    fn user_key(email: &str) -> String {
        cache_key!("user", email)
    }

    /// Create the administrator account if it does not exist yet.
    ///
    /// Returns whether an account was created.
    pub async fn seed_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        let record = self.new_record(UserId::new(ADMIN_USER_ID), name, email, password, Role::Admin)?;
        let created = self
            .cache
            .insert_new(&Self::user_key(&record.user.email), &record)
            .await?;
        if created {
            tracing::info!(email = %record.user.email, "admin account seeded");
        }
        Ok(created)
    }

    fn new_record(
        &self,
        id: UserId,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<UserRecord, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("name is required".into()));
        }
        let email = normalize_email(email);
        if !is_plausible_email(&email) {
            return Err(AuthError::Validation(format!("invalid email: {email}")));
        }
        PasswordHasher::validate_password(password)?;

        Ok(UserRecord {
            user: User {
                id,
                name: name.to_string(),
                email,
                role,
                registered_at: self.clock.now(),
            },
            password_hash: self.hasher.hash(password)?,
        })
    }
}

#[async_trait]
impl UserDirectory for KvUserDirectory {
    #[instrument(skip(self, password))]
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        let record: Option<UserRecord> = self.cache.get(&Self::user_key(&email)).await?;

        match record {
            Some(record) if self.hasher.verify(password, &record.password_hash)? => {
                tracing::info!(user_id = %record.user.id, "user authenticated");
                Ok(record.user)
            }
            _ => {
                tracing::warn!("authentication failed");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    #[instrument(skip(self, password))]
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let record = self.new_record(UserId::generate(), name, email, password, role)?;

        if !self
            .cache
            .insert_new(&Self::user_key(&record.user.email), &record)
            .await?
        {
            return Err(AuthError::DuplicateAccount(record.user.email));
        }

        tracing::info!(user_id = %record.user.id, role = %record.user.role, "user registered");
        Ok(record.user)
    }

    async fn find(&self, email: &str) -> Result<Option<User>, AuthError> {
        let record: Option<UserRecord> = self
            .cache
            .get(&Self::user_key(&normalize_email(email)))
            .await?;
        Ok(record.map(|r| r.user))
    }

    async fn list(&self) -> Result<Vec<User>, AuthError> {
        let mut users: Vec<User> = self
            .cache
            .scan::<UserRecord>("user:")
            .await?
            .into_iter()
            .map(|r| r.user)
            .collect();
        users.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.email.cmp(&b.email))
        });
        Ok(users)
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use omni_cache::MemoryStore;
    use omni_commerce::clock::ManualClock;
    use std::sync::Arc;

    fn directory() -> (KvUserDirectory, ManualClock) {
        let clock = ManualClock::default();
        let dir = KvUserDirectory::new(
            Cache::new(Arc::new(MemoryStore::new())),
            Arc::new(clock.clone()),
        );
        (dir, clock)
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let (dir, _) = directory();
        let user = dir
            .register("Asha", "Asha@Example.com", "secret1", Role::Customer)
            .await
            .unwrap();
        assert_eq!(user.email, "asha@example.com");
        assert!(user.id.as_str().starts_with("user-"));

        let again = dir.authenticate("asha@example.com", "secret1").await.unwrap();
        assert_eq!(again, user);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let (dir, _) = directory();
        dir.register("Asha", "asha@example.com", "secret1", Role::Customer)
            .await
            .unwrap();

        assert!(matches!(
            dir.authenticate("asha@example.com", "wrong!!").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            dir.authenticate("nobody@example.com", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (dir, _) = directory();
        dir.register("Asha", "asha@example.com", "secret1", Role::Customer)
            .await
            .unwrap();

        let err = dir
            .register("Other", "ASHA@example.com", "secret2", Role::Customer)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateAccount(_)));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let (dir, _) = directory();
        assert!(matches!(
            dir.register("", "a@b.c", "secret1", Role::Customer).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            dir.register("A", "not-an-email", "secret1", Role::Customer).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            dir.register("A", "a@b.c", "123", Role::Customer).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_admin_once_and_list() {
        let (dir, clock) = directory();
        assert!(dir
            .seed_admin("Admin", "admin@omnistore.com", "admin123")
            .await
            .unwrap());
        assert!(!dir
            .seed_admin("Admin", "admin@omnistore.com", "admin123")
            .await
            .unwrap());

        clock.advance(Duration::seconds(1));
        dir.register("Asha", "asha@example.com", "secret1", Role::Customer)
            .await
            .unwrap();

        let users = dir.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id.as_str(), ADMIN_USER_ID);
        assert!(users[0].is_admin());
        assert_eq!(users[1].email, "asha@example.com");

        let admin = dir.authenticate("admin@omnistore.com", "admin123").await.unwrap();
        assert_eq!(admin.role, Role::Admin);
    }
}
