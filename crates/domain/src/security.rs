use std::str::FromStr;

use serde::{Deserialize, Serialize};
use talentdesk_core::AppError;

/// Coarse authorization level of a signed-in principal.
///
/// An unauthenticated or not-yet-resolved principal has no role at all; it is
/// represented as `Option<Role>::None` by callers rather than as a variant,
/// so a resolved role is always one of these two values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Operator with access to the admin dashboard and job management.
    Admin,
    /// Default role for candidates and every unresolved lookup.
    #[default]
    Member,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    /// Returns whether the role grants administrative access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}
