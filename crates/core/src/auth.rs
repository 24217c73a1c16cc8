use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

/// Authenticated principal for the current session, as confirmed by the
/// authentication provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    session_token: String,
    user_id: String,
    email: String,
}

impl Identity {
    /// Creates an identity from provider session data.
    #[must_use]
    pub fn new(
        session_token: impl Into<String>,
        user_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            session_token: session_token.into(),
            user_id: user_id.into(),
            email: email.into(),
        }
    }

    /// Returns the opaque provider session token.
    #[must_use]
    pub fn session_token(&self) -> &str {
        self.session_token.as_str()
    }

    /// Returns the stable provider user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user_id.as_str()
    }

    /// Returns the email the principal signed in with.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns whether both identities name the same principal, ignoring the
    /// session token (a refreshed token is still the same principal).
    #[must_use]
    pub fn is_same_principal(&self, other: &Self) -> bool {
        self.user_id == other.user_id
    }
}

impl Debug for Identity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Identity")
            .field("session_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}
