//! Shopper session state.
//!
//! A session moves `Anonymous -> PhoneVerified -> Authenticated`. The phone
//! step needs a [`VerifiedPhone`] from the OTP verifier; the login step goes
//! through a [`UserDirectory`]. Records live in the versioned session store
//! under `session:{id}`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use omni_cache::{Cache, Session, SessionId, SharedClock};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::directory::UserDirectory;
use crate::otp::VerifiedPhone;
use crate::user::{Role, User};
use crate::{AuthError, PhoneNumber};

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    PhoneVerified,
    Authenticated,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::PhoneVerified => "phone_verified",
            SessionState::Authenticated => "authenticated",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted per-session identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: Option<User>,
    pub phone_verified: bool,
    pub phone: Option<PhoneNumber>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn state(&self) -> SessionState {
        if self.user.is_some() {
            SessionState::Authenticated
        } else if self.phone_verified {
            SessionState::PhoneVerified
        } else {
            SessionState::Anonymous
        }
    }

    fn clear_verification(&mut self) {
        self.phone_verified = false;
        self.phone = None;
        self.verified_at = None;
    }
}

/// Session policy switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Refuse login and registration until the phone is verified.
    pub require_phone_verification: bool,
    /// Drop the verified flag on logout.
    pub reverify_on_logout: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            require_phone_verification: true,
            reverify_on_logout: false,
        }
    }
}

/// Drives session transitions.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Session<SessionRecord>,
    directory: Arc<dyn UserDirectory>,
    config: SessionConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(cache: Cache, directory: Arc<dyn UserDirectory>, config: SessionConfig) -> Self {
        Self {
            sessions: Session::new(cache),
            directory,
            config,
        }
    }

    /// Stamp session records with `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.sessions = self.sessions.with_clock(clock);
        self
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current record, creating an anonymous one if missing.
    pub async fn load(&self, id: &SessionId) -> Result<SessionRecord, AuthError> {
        Ok(self.sessions.get_or_create(id).await?)
    }

    pub async fn state(&self, id: &SessionId) -> Result<SessionState, AuthError> {
        Ok(self.load(id).await?.state())
    }

    pub async fn current_user(&self, id: &SessionId) -> Result<Option<User>, AuthError> {
        Ok(self.load(id).await?.user)
    }

    /// Whether the OTP gate has been passed.
    pub async fn browsing_allowed(&self, id: &SessionId) -> Result<bool, AuthError> {
        Ok(self.load(id).await?.phone_verified)
    }

    /// Record a successful phone verification.
    #[instrument(skip(self, proof), fields(session = %id))]
    pub async fn mark_verified(
        &self,
        id: &SessionId,
        proof: VerifiedPhone,
    ) -> Result<SessionRecord, AuthError> {
        let record = self
            .sessions
            .update::<_, AuthError>(id, |record| {
                record.phone_verified = true;
                record.phone = Some(proof.phone().clone());
                record.verified_at = Some(proof.verified_at());
                Ok(())
            })
            .await?;

        tracing::info!(phone = %proof.phone().masked(), "session phone verified");
        Ok(record)
    }

    /// Log in with email and password.
    ///
    /// Wrong credentials leave the session as it was.
    #[instrument(skip(self, password), fields(session = %id))]
    pub async fn login(
        &self,
        id: &SessionId,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        self.ensure_gate_passed(id).await?;
        let user = self.directory.authenticate(email, password).await?;
        self.attach(id, &user).await?;

        tracing::info!(user_id = %user.id, "session logged in");
        Ok(user)
    }

    /// Create a customer account and log it in.
    #[instrument(skip(self, password), fields(session = %id))]
    pub async fn register(
        &self,
        id: &SessionId,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        self.ensure_gate_passed(id).await?;
        let user = self
            .directory
            .register(name, email, password, Role::Customer)
            .await?;
        self.attach(id, &user).await?;

        tracing::info!(user_id = %user.id, "session registered");
        Ok(user)
    }

    /// Clear the user. The phone flag survives unless configured otherwise.
    #[instrument(skip(self), fields(session = %id))]
    pub async fn logout(&self, id: &SessionId) -> Result<SessionRecord, AuthError> {
        let reverify = self.config.reverify_on_logout;
        let record = self
            .sessions
            .update::<_, AuthError>(id, |record| {
                record.user = None;
                if reverify {
                    record.clear_verification();
                }
                Ok(())
            })
            .await?;

        tracing::info!("session logged out");
        Ok(record)
    }

    /// Delete the session record entirely.
    pub async fn destroy(&self, id: &SessionId) -> Result<(), AuthError> {
        self.sessions.delete(id).await?;
        tracing::debug!(session = %id, "session destroyed");
        Ok(())
    }

    async fn ensure_gate_passed(&self, id: &SessionId) -> Result<(), AuthError> {
        if self.config.require_phone_verification && !self.browsing_allowed(id).await? {
            return Err(AuthError::PhoneNotVerified);
        }
        Ok(())
    }

    async fn attach(&self, id: &SessionId, user: &User) -> Result<(), AuthError> {
        let require = self.config.require_phone_verification;
        self.sessions
            .update::<_, AuthError>(id, |record| {
                if require && !record.phone_verified {
                    return Err(AuthError::PhoneNotVerified);
                }
                record.user = Some(user.clone());
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::KvUserDirectory;
    use omni_cache::MemoryStore;
    use omni_commerce::clock::system_clock;

    const EMAIL: &str = "asha@example.com";
    const PASSWORD: &str = "secret1";

    async fn manager(config: SessionConfig) -> SessionManager {
        let cache = Cache::new(Arc::new(MemoryStore::new()));
        let directory = KvUserDirectory::new(cache.clone(), system_clock());
        directory
            .register("Asha", EMAIL, PASSWORD, Role::Customer)
            .await
            .unwrap();
        SessionManager::new(cache, Arc::new(directory), config)
    }

    fn proof() -> VerifiedPhone {
        VerifiedPhone::new(
            PhoneNumber::normalize("9876543210").unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_new_session_is_anonymous() {
        let manager = manager(SessionConfig::default()).await;
        let id = SessionId::generate();

        assert_eq!(manager.state(&id).await.unwrap(), SessionState::Anonymous);
        assert!(!manager.browsing_allowed(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_login_requires_verified_phone() {
        let manager = manager(SessionConfig::default()).await;
        let id = SessionId::generate();

        assert!(matches!(
            manager.login(&id, EMAIL, PASSWORD).await,
            Err(AuthError::PhoneNotVerified)
        ));
        assert_eq!(manager.state(&id).await.unwrap(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_full_transition_chain() {
        let manager = manager(SessionConfig::default()).await;
        let id = SessionId::generate();

        manager.mark_verified(&id, proof()).await.unwrap();
        assert_eq!(manager.state(&id).await.unwrap(), SessionState::PhoneVerified);

        let user = manager.login(&id, EMAIL, PASSWORD).await.unwrap();
        assert_eq!(user.email, EMAIL);
        assert_eq!(manager.state(&id).await.unwrap(), SessionState::Authenticated);

        let record = manager.logout(&id).await.unwrap();
        assert!(record.user.is_none());
        assert!(record.phone_verified);
        assert_eq!(record.state(), SessionState::PhoneVerified);
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_state() {
        let manager = manager(SessionConfig::default()).await;
        let id = SessionId::generate();
        manager.mark_verified(&id, proof()).await.unwrap();
        let before = manager.load(&id).await.unwrap();

        assert!(matches!(
            manager.login(&id, EMAIL, "nope-nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert_eq!(manager.load(&id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_register_logs_in_and_rejects_duplicates() {
        let manager = manager(SessionConfig::default()).await;
        let id = SessionId::generate();
        manager.mark_verified(&id, proof()).await.unwrap();

        let user = manager
            .register(&id, "Ravi", "ravi@example.com", "hunter22")
            .await
            .unwrap();
        assert_eq!(manager.current_user(&id).await.unwrap(), Some(user));

        let other = SessionId::generate();
        manager.mark_verified(&other, proof()).await.unwrap();
        assert!(matches!(
            manager.register(&other, "Ravi", "ravi@example.com", "hunter22").await,
            Err(AuthError::DuplicateAccount(_))
        ));
    }

    #[tokio::test]
    async fn test_reverify_on_logout() {
        let manager = manager(SessionConfig {
            reverify_on_logout: true,
            ..SessionConfig::default()
        })
        .await;
        let id = SessionId::generate();
        manager.mark_verified(&id, proof()).await.unwrap();
        manager.login(&id, EMAIL, PASSWORD).await.unwrap();

        let record = manager.logout(&id).await.unwrap();
        assert_eq!(record.state(), SessionState::Anonymous);
        assert!(record.phone.is_none());
    }

    #[tokio::test]
    async fn test_gate_can_be_disabled() {
        let manager = manager(SessionConfig {
            require_phone_verification: false,
            ..SessionConfig::default()
        })
        .await;
        let id = SessionId::generate();

        manager.login(&id, EMAIL, PASSWORD).await.unwrap();
        assert_eq!(manager.state(&id).await.unwrap(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_destroy_resets() {
        let manager = manager(SessionConfig::default()).await;
        let id = SessionId::generate();
        manager.mark_verified(&id, proof()).await.unwrap();

        manager.destroy(&id).await.unwrap();
        assert_eq!(manager.state(&id).await.unwrap(), SessionState::Anonymous);
    }
}
