use serde::{Deserialize, Serialize};
use talentdesk_application::{RegistrationStep, SessionService, SessionSnapshot};
use talentdesk_core::{AppError, AppResult, Identity};
use tower_sessions::Session;
use uuid::Uuid;

use crate::dto::parse_registration_step;
use crate::state::AppState;

pub const SESSION_CLIENT_KEY: &str = "client_key";
pub const SESSION_PENDING_REGISTRATION_KEY: &str = "pending_registration";

/// Registration left incomplete by this client, kept server-side so the
/// completion request cannot name another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub user_id: String,
    pub email: String,
    pub pending_steps: Vec<String>,
}

impl PendingRegistration {
    pub fn new(identity: &Identity, steps: &[RegistrationStep]) -> Self {
        Self {
            user_id: identity.user_id().to_owned(),
            email: identity.email().to_owned(),
            pending_steps: steps.iter().map(|step| step.as_str().to_owned()).collect(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(String::new(), self.user_id.clone(), self.email.clone())
    }

    pub fn steps(&self) -> AppResult<Vec<RegistrationStep>> {
        self.pending_steps
            .iter()
            .map(|step| parse_registration_step(step))
            .collect()
    }
}

pub async fn client_key(session: &Session) -> AppResult<Option<Uuid>> {
    session
        .get::<Uuid>(SESSION_CLIENT_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read client session key: {error}")))
}

/// Returns the session service owned by the calling client, if it signed in.
pub async fn current_service(
    state: &AppState,
    session: &Session,
) -> AppResult<Option<SessionService>> {
    let Some(key) = client_key(session).await? else {
        return Ok(None);
    };

    Ok(state.sessions.get(key).await)
}

pub async fn current_snapshot(state: &AppState, session: &Session) -> AppResult<SessionSnapshot> {
    Ok(current_service(state, session)
        .await?
        .map_or_else(SessionSnapshot::anonymous, |service| service.snapshot()))
}

/// Binds `key` to the client under a fresh session id.
pub async fn attach_client_key(session: &Session, key: Uuid) -> AppResult<()> {
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_CLIENT_KEY, key)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist client session key: {error}")))
}

pub async fn pending_registration(session: &Session) -> AppResult<Option<PendingRegistration>> {
    session
        .get::<PendingRegistration>(SESSION_PENDING_REGISTRATION_KEY)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to read pending registration: {error}"))
        })
}

pub async fn store_pending_registration(
    session: &Session,
    pending: &PendingRegistration,
) -> AppResult<()> {
    session
        .insert(SESSION_PENDING_REGISTRATION_KEY, pending)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist pending registration: {error}"))
        })
}

pub async fn clear_pending_registration(session: &Session) -> AppResult<()> {
    session
        .remove::<PendingRegistration>(SESSION_PENDING_REGISTRATION_KEY)
        .await
        .map(|_| ())
        .map_err(|error| {
            AppError::Internal(format!("failed to clear pending registration: {error}"))
        })
}
