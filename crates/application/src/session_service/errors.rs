use std::fmt;

use talentdesk_core::{AppError, Identity};
use thiserror::Error;

use crate::RetryExhausted;

use super::RegistrationStep;

/// Error returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Input was rejected before contacting the provider.
    #[error("{0}")]
    Validation(String),

    /// The provider rejected the call. Carries the provider's message.
    #[error("{0}")]
    Provider(String),

    /// `init` has not been called yet.
    #[error("session service is not initialized")]
    NotInitialized,

    /// The service was disposed.
    #[error("session service has been disposed")]
    Disposed,
}

impl From<AppError> for AuthError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation(message) => Self::Validation(message),
            AppError::Provider(message) | AppError::Unauthorized(message) => {
                Self::Provider(message)
            }
            other => Self::Provider(other.to_string()),
        }
    }
}

/// A post-credential registration write that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// Which write failed.
    pub step: RegistrationStep,
    /// Final error after retries.
    pub error: RetryExhausted,
}

/// A registration whose credential exists but whose follow-up writes did not
/// all succeed.
///
/// The identity is carried so the caller can finish the remaining steps with
/// [`super::SessionService::complete_registration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialRegistration {
    identity: Identity,
    failures: Vec<StepFailure>,
}

impl PartialRegistration {
    pub(super) fn new(identity: Identity, failures: Vec<StepFailure>) -> Self {
        Self { identity, failures }
    }

    /// Returns the identity of the created credential.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns every failed step with its error.
    #[must_use]
    pub fn failures(&self) -> &[StepFailure] {
        &self.failures
    }

    /// Returns the steps still to be completed.
    #[must_use]
    pub fn pending_steps(&self) -> Vec<RegistrationStep> {
        self.failures.iter().map(|failure| failure.step).collect()
    }

    /// Consumes the error and returns the created identity.
    #[must_use]
    pub fn into_identity(self) -> Identity {
        self.identity
    }
}

impl fmt::Display for PartialRegistration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "account created for user '{}' but registration is incomplete",
            self.identity.user_id()
        )?;
        for failure in &self.failures {
            write!(formatter, "; {}", failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for PartialRegistration {}

/// Error returned by registration operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// No credential was created.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The credential exists; some follow-up writes failed.
    #[error(transparent)]
    Partial(#[from] PartialRegistration),
}

impl RegistrationError {
    /// Returns the created identity when the credential exists.
    #[must_use]
    pub fn created_identity(&self) -> Option<&Identity> {
        match self {
            Self::Auth(_) => None,
            Self::Partial(partial) => Some(partial.identity()),
        }
    }
}
