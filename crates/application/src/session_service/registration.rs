use talentdesk_domain::{EmailAddress, ProfileFields, validate_password};

use crate::RetryExhausted;

use super::*;

/// Write performed after the credential has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegistrationStep {
    /// Role record defaulting to member.
    RoleRecord,
    /// Candidate profile.
    Profile,
}

impl RegistrationStep {
    /// Every follow-up step, in execution order.
    pub const ALL: [Self; 2] = [Self::RoleRecord, Self::Profile];

    /// Returns the stable identifier of the step.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleRecord => "role_record",
            Self::Profile => "profile",
        }
    }
}

impl SessionService {
    /// Registers a candidate: creates the credential, then the role record and
    /// the profile.
    ///
    /// Email and password are validated before the provider is called. When
    /// the credential is created but a follow-up write keeps failing, the
    /// result is [`RegistrationError::Partial`] carrying the new identity.
    /// Both writes are always attempted. Registration does not sign the
    /// user in; the provider's event stream decides that.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileFields,
    ) -> Result<Identity, RegistrationError> {
        self.ensure_running().await?;

        let email = EmailAddress::new(email).map_err(AuthError::from)?;
        validate_password(password).map_err(AuthError::from)?;

        let identity = self
            .inner
            .auth_provider
            .sign_up(email.as_str(), password)
            .await
            .map_err(|error| {
                warn!(error = %error, "sign-up rejected by provider");
                AuthError::from(error)
            })?;
        info!(user_id = %identity.user_id(), "credential created");

        self.run_follow_up_steps(&identity, &RegistrationStep::ALL, profile)
            .await?;
        Ok(identity)
    }

    /// Retries the follow-up writes left pending by a partial registration.
    pub async fn complete_registration(
        &self,
        identity: &Identity,
        pending: &[RegistrationStep],
        profile: &ProfileFields,
    ) -> Result<(), RegistrationError> {
        self.ensure_running().await?;
        self.run_follow_up_steps(identity, pending, profile).await
    }

    async fn run_follow_up_steps(
        &self,
        identity: &Identity,
        steps: &[RegistrationStep],
        profile: &ProfileFields,
    ) -> Result<(), RegistrationError> {
        let mut steps = steps.to_vec();
        steps.sort_unstable();
        steps.dedup();

        let mut failures = Vec::new();
        for step in steps {
            if let Err(error) = self.run_step(identity, step, profile).await {
                warn!(
                    user_id = %identity.user_id(),
                    step = step.as_str(),
                    error = %error,
                    "registration step failed"
                );
                failures.push(StepFailure { step, error });
            }
        }

        if failures.is_empty() {
            info!(user_id = %identity.user_id(), "registration complete");
            return Ok(());
        }

        Err(PartialRegistration::new(identity.clone(), failures).into())
    }

    async fn run_step(
        &self,
        identity: &Identity,
        step: RegistrationStep,
        profile: &ProfileFields,
    ) -> Result<(), RetryExhausted> {
        let policy = self.inner.registration_retry;
        let user_id = identity.user_id();

        match step {
            RegistrationStep::RoleRecord => {
                let role_store = &self.inner.role_store;
                let created = policy
                    .run("create role record", move || {
                        role_store.create_role(user_id, Role::Member)
                    })
                    .await?;
                if !created {
                    debug!(user_id, "role record already present; left unchanged");
                }
                Ok(())
            }
            RegistrationStep::Profile => {
                let profile_store = &self.inner.profile_store;
                let email = identity.email();
                policy
                    .run("create profile", move || {
                        profile_store.create_profile(user_id, email, profile)
                    })
                    .await
            }
        }
    }
}
