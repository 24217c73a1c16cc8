//! Session and role state of the signed-in principal.
//!
//! [`SessionService`] owns a single `(identity, role)` slot and publishes it
//! through a watch channel. Identity changes arrive from sign-in/sign-out
//! calls and from the provider's event stream; each change that names a new
//! principal starts a role resolution tagged with the slot epoch at the time
//! it started. A resolution only commits if the epoch is unchanged, so a slow
//! lookup for an earlier principal can never overwrite a newer session.

use std::sync::{Arc, Weak};

use talentdesk_core::Identity;
use talentdesk_domain::Role;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    AdminAllowlist, AuthProvider, ProfileStore, RetryPolicy, RoleResolver, RoleStore,
    SessionEvent,
};

mod errors;
mod registration;

pub use errors::{AuthError, PartialRegistration, RegistrationError, StepFailure};
pub use registration::RegistrationStep;

/// Position of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Startup session check has not finished.
    Initializing,
    /// No principal is signed in.
    Anonymous,
    /// A principal is signed in and its role lookup is in flight.
    AuthenticatingRole,
    /// A principal is signed in with a resolved role.
    Resolved(Role),
}

/// Observable `{identity, role, loading}` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    phase: SessionPhase,
    identity: Option<Identity>,
}

impl SessionSnapshot {
    fn initializing() -> Self {
        Self {
            phase: SessionPhase::Initializing,
            identity: None,
        }
    }

    /// Returns the snapshot of a client nobody is signed in as.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            phase: SessionPhase::Anonymous,
            identity: None,
        }
    }

    /// Returns the state machine position.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Returns the signed-in identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Returns the resolved role. `None` means unknown: nobody is signed in
    /// or the lookup has not completed yet.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match self.phase {
            SessionPhase::Resolved(role) => Some(role),
            _ => None,
        }
    }

    /// Returns whether the state is still settling.
    #[must_use]
    pub fn loading(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Initializing | SessionPhase::AuthenticatingRole
        )
    }
}

/// Result of a sign-out. The local session is cleared in both cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutOutcome {
    /// The provider invalidated the session.
    Confirmed,
    /// The provider call failed; only local state was cleared.
    LocalOnly {
        /// Provider failure message.
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Disposed,
}

struct SessionSlot {
    snapshot: SessionSnapshot,
    epoch: u64,
    lifecycle: Lifecycle,
}

struct ResolutionTicket {
    epoch: u64,
    identity: Identity,
}

struct SessionInner {
    auth_provider: Arc<dyn AuthProvider>,
    role_resolver: RoleResolver,
    role_store: Arc<dyn RoleStore>,
    profile_store: Arc<dyn ProfileStore>,
    registration_retry: RetryPolicy,
    slot: Mutex<SessionSlot>,
    snapshots: watch::Sender<SessionSnapshot>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Some(handle) = self.event_loop.get_mut().take() {
            handle.abort();
        }
    }
}

/// Application service owning the session/role state machine.
///
/// Lifecycle is `new` → [`SessionService::init`] → [`SessionService::dispose`].
/// Operations called before `init` or after `dispose` fail with
/// [`AuthError::NotInitialized`] or [`AuthError::Disposed`].
#[derive(Clone)]
pub struct SessionService {
    inner: Arc<SessionInner>,
}

impl SessionService {
    /// Creates a service in the `Initializing` phase.
    #[must_use]
    pub fn new(
        auth_provider: Arc<dyn AuthProvider>,
        role_store: Arc<dyn RoleStore>,
        profile_store: Arc<dyn ProfileStore>,
        allowlist: AdminAllowlist,
        registration_retry: RetryPolicy,
    ) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::initializing());
        Self {
            inner: Arc::new(SessionInner {
                auth_provider,
                role_resolver: RoleResolver::new(allowlist, role_store.clone()),
                role_store,
                profile_store,
                registration_retry,
                slot: Mutex::new(SessionSlot {
                    snapshot: SessionSnapshot::initializing(),
                    epoch: 0,
                    lifecycle: Lifecycle::Created,
                }),
                snapshots,
                event_loop: Mutex::new(None),
            }),
        }
    }

    /// Starts listening to provider events and restores the provider's
    /// current session, if any.
    ///
    /// Returns the settled snapshot. Calling `init` on a running service
    /// returns the current snapshot without side effects.
    pub async fn init(&self) -> Result<SessionSnapshot, AuthError> {
        {
            let mut slot = self.inner.slot.lock().await;
            match slot.lifecycle {
                Lifecycle::Disposed => return Err(AuthError::Disposed),
                Lifecycle::Running => return Ok(slot.snapshot.clone()),
                Lifecycle::Created => slot.lifecycle = Lifecycle::Running,
            }
        }

        let events = self.inner.auth_provider.subscribe();
        let handle = self.spawn_event_loop(events);
        *self.inner.event_loop.lock().await = Some(handle);

        let restored = match self.inner.auth_provider.current_session().await {
            Ok(identity) => identity,
            Err(error) => {
                warn!(error = %error, "session restore failed; starting anonymous");
                None
            }
        };

        self.handle_session_event(SessionEvent::from(restored)).await;
        Ok(self.snapshot())
    }

    /// Stops the event loop and clears the session. Idempotent.
    pub async fn dispose(&self) {
        if let Some(handle) = self.inner.event_loop.lock().await.take() {
            handle.abort();
        }

        let mut slot = self.inner.slot.lock().await;
        if slot.lifecycle == Lifecycle::Disposed {
            return;
        }

        slot.lifecycle = Lifecycle::Disposed;
        slot.epoch = slot.epoch.wrapping_add(1);
        slot.snapshot = SessionSnapshot::anonymous();
        self.publish(&slot);
        info!("session service disposed");
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Signs in with email and password.
    ///
    /// Both fields must be non-empty; they are checked before the provider is
    /// called. The session state changes only after the provider confirms,
    /// and the call returns once the role is resolved.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.ensure_running().await?;

        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "email and password are required".to_owned(),
            ));
        }

        let identity = self
            .inner
            .auth_provider
            .sign_in(email, password)
            .await
            .map_err(|error| {
                warn!(error = %error, "sign-in rejected by provider");
                AuthError::from(error)
            })?;

        info!(user_id = %identity.user_id(), "signed in");
        self.handle_session_event(SessionEvent::Active(identity.clone()))
            .await;
        self.wait_until_settled(&identity).await;
        Ok(identity)
    }

    /// Signs out. The local session always ends up anonymous, even when the
    /// provider call fails.
    pub async fn sign_out(&self) -> SignOutOutcome {
        let outcome = match self.inner.auth_provider.sign_out().await {
            Ok(()) => SignOutOutcome::Confirmed,
            Err(error) => {
                warn!(error = %error, "provider sign-out failed; clearing local session");
                SignOutOutcome::LocalOnly {
                    reason: error.to_string(),
                }
            }
        };

        let mut slot = self.inner.slot.lock().await;
        slot.epoch = slot.epoch.wrapping_add(1);
        slot.snapshot = SessionSnapshot::anonymous();
        self.publish(&slot);
        info!("signed out");

        outcome
    }

    /// Applies a session change pushed by the provider and, for a new
    /// principal, resolves its role before returning.
    pub async fn handle_session_event(&self, event: SessionEvent) {
        if let Some(ticket) = self.begin_transition(event.into_identity()).await {
            self.resolve_and_commit(ticket).await;
        }
    }

    /// Waits until the role of `identity` is resolved or the session moved
    /// on. The provider may have pushed the same sign-in through the event
    /// stream first, in which case the resolution runs on the event loop.
    async fn wait_until_settled(&self, identity: &Identity) {
        let mut snapshots = self.subscribe();
        let _ = snapshots
            .wait_for(|snapshot| {
                snapshot.phase() != SessionPhase::AuthenticatingRole
                    || !snapshot
                        .identity()
                        .is_some_and(|current| current.is_same_principal(identity))
            })
            .await;
    }

    async fn ensure_running(&self) -> Result<(), AuthError> {
        match self.inner.slot.lock().await.lifecycle {
            Lifecycle::Running => Ok(()),
            Lifecycle::Created => Err(AuthError::NotInitialized),
            Lifecycle::Disposed => Err(AuthError::Disposed),
        }
    }

    async fn begin_transition(&self, identity: Option<Identity>) -> Option<ResolutionTicket> {
        let mut slot = self.inner.slot.lock().await;
        if slot.lifecycle != Lifecycle::Running {
            debug!("ignoring session change outside running lifecycle");
            return None;
        }

        let Some(identity) = identity else {
            if slot.snapshot.phase != SessionPhase::Anonymous {
                slot.epoch = slot.epoch.wrapping_add(1);
                slot.snapshot = SessionSnapshot::anonymous();
                self.publish(&slot);
                info!("session ended");
            }
            return None;
        };

        let same_principal = slot
            .snapshot
            .identity
            .as_ref()
            .is_some_and(|current| current.is_same_principal(&identity));
        if same_principal {
            // Token refresh: the role in flight or resolved still applies.
            slot.snapshot.identity = Some(identity);
            self.publish(&slot);
            return None;
        }

        slot.epoch = slot.epoch.wrapping_add(1);
        slot.snapshot = SessionSnapshot {
            phase: SessionPhase::AuthenticatingRole,
            identity: Some(identity.clone()),
        };
        self.publish(&slot);

        Some(ResolutionTicket {
            epoch: slot.epoch,
            identity,
        })
    }

    async fn resolve_and_commit(&self, ticket: ResolutionTicket) {
        let role = self.inner.role_resolver.resolve(&ticket.identity).await;

        let mut slot = self.inner.slot.lock().await;
        if slot.lifecycle != Lifecycle::Running || slot.epoch != ticket.epoch {
            debug!(
                user_id = %ticket.identity.user_id(),
                "discarding stale role resolution"
            );
            return;
        }

        slot.snapshot.phase = SessionPhase::Resolved(role);
        self.publish(&slot);
        info!(
            user_id = %ticket.identity.user_id(),
            role = role.as_str(),
            "session role resolved"
        );
    }

    fn publish(&self, slot: &SessionSlot) {
        self.inner.snapshots.send_replace(slot.snapshot.clone());
    }

    fn spawn_event_loop(&self, mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
        let inner: Weak<SessionInner> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            loop {
                let received = events.recv().await;
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let service = Self { inner };

                let event = match received {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session events lagged; resyncing from provider");
                        match service.inner.auth_provider.current_session().await {
                            Ok(identity) => SessionEvent::from(identity),
                            Err(error) => {
                                warn!(error = %error, "session resync failed");
                                continue;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("session event stream closed");
                        break;
                    }
                };

                // Transitions are applied in arrival order; only the lookup
                // runs detached so a slow one never delays a newer event.
                if let Some(ticket) = service.begin_transition(event.into_identity()).await {
                    tokio::spawn(async move {
                        service.resolve_and_commit(ticket).await;
                    });
                }
            }
        })
    }
}
