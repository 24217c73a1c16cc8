use async_trait::async_trait;
use talentdesk_core::{AppResult, Identity};
use talentdesk_domain::{ProfileFields, Role};
use tokio::sync::broadcast;

/// Session change pushed by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session is active for this identity (sign-in, restore or refresh).
    Active(Identity),
    /// No session is active anymore.
    Ended,
}

impl SessionEvent {
    /// Returns the identity carried by the event.
    #[must_use]
    pub fn into_identity(self) -> Option<Identity> {
        match self {
            Self::Active(identity) => Some(identity),
            Self::Ended => None,
        }
    }
}

impl From<Option<Identity>> for SessionEvent {
    fn from(identity: Option<Identity>) -> Self {
        identity.map_or(Self::Ended, Self::Active)
    }
}

/// Port for the hosted authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchanges email and password for a session.
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity>;

    /// Creates a credential and returns its identity.
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity>;

    /// Invalidates the current session.
    async fn sign_out(&self) -> AppResult<()>;

    /// Returns the session restored by the provider, if any.
    async fn current_session(&self) -> AppResult<Option<Identity>>;

    /// Subscribes to session changes. Every change made through this
    /// provider, or pushed by the hosted service, is delivered to all
    /// receivers.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// Port for persisted user-role records.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Returns the stored role value for a user, verbatim.
    ///
    /// The value is not validated by the store; interpreting unknown values
    /// is the resolver's job.
    async fn get_role(&self, user_id: &str) -> AppResult<Option<String>>;

    /// Creates the role record of a user unless one already exists.
    ///
    /// An existing record is never overwritten. Returns whether a record was
    /// written.
    async fn create_role(&self, user_id: &str, role: Role) -> AppResult<bool>;
}

/// Port for candidate profile records.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Creates the profile of a newly registered user.
    async fn create_profile(
        &self,
        user_id: &str,
        email: &str,
        fields: &ProfileFields,
    ) -> AppResult<()>;
}
