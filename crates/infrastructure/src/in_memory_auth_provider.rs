//! In-memory authentication provider for local development and tests.
//!
//! Credentials are hashed with Argon2id (m=19456, t=2, p=1).

use std::collections::HashMap;
use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use async_trait::async_trait;
use talentdesk_application::{AuthProvider, SessionEvent};
use talentdesk_core::{AppError, AppResult, Identity};
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::debug;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    password_hash: String,
}

/// Process-local [`AuthProvider`] keeping accounts and the current session
/// in memory.
///
/// Each instance holds one client's session. Instances created with
/// [`InMemoryAuthProvider::fork`] share the account table.
pub struct InMemoryAuthProvider {
    argon2: Argon2<'static>,
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    current: Mutex<Option<Identity>>,
    events: broadcast::Sender<SessionEvent>,
}

impl InMemoryAuthProvider {
    /// Creates a provider without accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_accounts(Arc::new(RwLock::new(HashMap::new())))
    }

    /// Returns a provider for another client: same accounts, no session.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self::with_accounts(Arc::clone(&self.accounts))
    }

    fn with_accounts(accounts: Arc<RwLock<HashMap<String, Account>>>) -> Self {
        let params = Params::new(19456, 2, 1, None).unwrap_or_else(|_| Params::default());
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            accounts,
            current: Mutex::new(None),
            events,
        }
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|error| AppError::Internal(format!("failed to hash password: {error}")))?;

        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|error| {
            AppError::Internal(format!("failed to parse password hash: {error}"))
        })?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }

    fn broadcast(&self, event: SessionEvent) {
        // No receiver is not an error: nobody is listening yet.
        let _ = self.events.send(event);
    }
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        let key = email.trim().to_lowercase();
        let account = self.accounts.read().await.get(&key).cloned();

        let Some(account) = account else {
            // Keep timing comparable to the known-account path.
            let _ = self.hash_password(password);
            return Err(AppError::Provider(INVALID_CREDENTIALS.to_owned()));
        };

        if !self.verify_password(password, &account.password_hash)? {
            return Err(AppError::Provider(INVALID_CREDENTIALS.to_owned()));
        }

        let identity = Identity::new(Uuid::new_v4().to_string(), account.user_id, key);
        *self.current.lock().await = Some(identity.clone());
        self.broadcast(SessionEvent::Active(identity.clone()));
        debug!(user_id = %identity.user_id(), "in-memory sign-in");

        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity> {
        let key = email.trim().to_lowercase();
        let password_hash = self.hash_password(password)?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AppError::Provider("User already registered".to_owned()));
        }

        let user_id = Uuid::new_v4().to_string();
        accounts.insert(
            key.clone(),
            Account {
                user_id: user_id.clone(),
                password_hash,
            },
        );

        Ok(Identity::new(Uuid::new_v4().to_string(), user_id, key))
    }

    async fn sign_out(&self) -> AppResult<()> {
        if self.current.lock().await.take().is_some() {
            self.broadcast(SessionEvent::Ended);
        }
        Ok(())
    }

    async fn current_session(&self) -> AppResult<Option<Identity>> {
        Ok(self.current.lock().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use talentdesk_application::{AuthProvider, SessionEvent};
    use talentdesk_core::{AppError, AppResult};

    use super::InMemoryAuthProvider;

    #[tokio::test]
    async fn sign_up_then_sign_in_broadcasts_session() -> AppResult<()> {
        let provider = InMemoryAuthProvider::new();
        let mut events = provider.subscribe();

        let created = provider.sign_up("Cand@Talentdesk.test", "secret1").await?;
        let signed_in = provider.sign_in("cand@talentdesk.test", "secret1").await?;

        assert_eq!(created.user_id(), signed_in.user_id());
        assert_eq!(signed_in.email(), "cand@talentdesk.test");
        assert_eq!(provider.current_session().await?, Some(signed_in.clone()));
        assert_eq!(events.try_recv().ok(), Some(SessionEvent::Active(signed_in)));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_account_share_one_message() -> AppResult<()> {
        let provider = InMemoryAuthProvider::new();
        provider.sign_up("cand@talentdesk.test", "secret1").await?;

        let wrong = provider.sign_in("cand@talentdesk.test", "secret2").await;
        let unknown = provider.sign_in("ghost@talentdesk.test", "secret1").await;

        let expected = Err(AppError::Provider("Invalid login credentials".to_owned()));
        assert_eq!(wrong, expected);
        assert_eq!(unknown, expected);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_rejected() -> AppResult<()> {
        let provider = InMemoryAuthProvider::new();
        provider.sign_up("cand@talentdesk.test", "secret1").await?;

        let duplicate = provider.sign_up("CAND@talentdesk.test", "secret1").await;
        assert!(matches!(duplicate, Err(AppError::Provider(_))));
        Ok(())
    }

    #[tokio::test]
    async fn sign_out_ends_the_session() -> AppResult<()> {
        let provider = InMemoryAuthProvider::new();
        provider.sign_up("cand@talentdesk.test", "secret1").await?;
        provider.sign_in("cand@talentdesk.test", "secret1").await?;
        let mut events = provider.subscribe();

        provider.sign_out().await?;

        assert_eq!(provider.current_session().await?, None);
        assert_eq!(events.try_recv().ok(), Some(SessionEvent::Ended));
        Ok(())
    }

    #[tokio::test]
    async fn forked_providers_share_accounts_but_not_sessions() -> AppResult<()> {
        let first = InMemoryAuthProvider::new();
        let second = first.fork();
        first.sign_up("cand@talentdesk.test", "secret1").await?;

        let signed_in = second.sign_in("cand@talentdesk.test", "secret1").await?;

        assert_eq!(second.current_session().await?, Some(signed_in));
        assert_eq!(first.current_session().await?, None);
        Ok(())
    }
}
