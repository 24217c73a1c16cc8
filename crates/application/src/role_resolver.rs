use std::sync::Arc;

use talentdesk_core::Identity;
use talentdesk_domain::Role;
use tracing::{debug, warn};

use crate::{AdminAllowlist, RoleStore};

/// Determines the role of an authenticated identity.
///
/// Resolution never fails: the allowlist is consulted first, then a single
/// role-store lookup; a missing record, an unreadable value or a lookup
/// error all resolve to [`Role::Member`].
#[derive(Clone)]
pub struct RoleResolver {
    allowlist: AdminAllowlist,
    role_store: Arc<dyn RoleStore>,
}

impl RoleResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new(allowlist: AdminAllowlist, role_store: Arc<dyn RoleStore>) -> Self {
        Self {
            allowlist,
            role_store,
        }
    }

    /// Resolves the role of an identity.
    pub async fn resolve(&self, identity: &Identity) -> Role {
        if self.allowlist.contains(identity.email()) {
            debug!(user_id = %identity.user_id(), "identity matched admin allowlist");
            return Role::Admin;
        }

        match self.role_store.get_role(identity.user_id()).await {
            Ok(Some(stored)) => match stored.parse::<Role>() {
                Ok(role) => role,
                Err(_) => {
                    warn!(
                        user_id = %identity.user_id(),
                        stored_role = %stored,
                        "unrecognized stored role; defaulting to member"
                    );
                    Role::Member
                }
            },
            Ok(None) => {
                debug!(user_id = %identity.user_id(), "no role record; defaulting to member");
                Role::Member
            }
            Err(error) => {
                warn!(
                    user_id = %identity.user_id(),
                    error = %error,
                    "role lookup failed; defaulting to member"
                );
                Role::Member
            }
        }
    }
}
