use serde::{Deserialize, Serialize};
use talentdesk_application::{RegistrationStep, SessionPhase, SessionSnapshot, SignOutOutcome};
use talentdesk_core::{AppError, AppResult};
use talentdesk_domain::{JobFacets, NormalizedJob, ProfileFields};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Observable session state. The session token is never exposed.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/session-response.ts"
)]
pub struct SessionResponse {
    pub phase: String,
    pub loading: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl From<&SessionSnapshot> for SessionResponse {
    fn from(snapshot: &SessionSnapshot) -> Self {
        let phase = match snapshot.phase() {
            SessionPhase::Initializing => "initializing",
            SessionPhase::Anonymous => "anonymous",
            SessionPhase::AuthenticatingRole => "authenticating_role",
            SessionPhase::Resolved(_) => "resolved",
        };

        Self {
            phase: phase.to_owned(),
            loading: snapshot.loading(),
            user_id: snapshot
                .identity()
                .map(|identity| identity.user_id().to_owned()),
            email: snapshot.identity().map(|identity| identity.email().to_owned()),
            role: snapshot.role().map(|role| role.as_str().to_owned()),
        }
    }
}

/// Incoming payload for email/password sign-in.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/sign-in-request.ts"
)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Sign-out result.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/sign-out-response.ts"
)]
pub struct SignOutResponse {
    pub confirmed: bool,
    pub detail: Option<String>,
}

impl From<SignOutOutcome> for SignOutResponse {
    fn from(outcome: SignOutOutcome) -> Self {
        match outcome {
            SignOutOutcome::Confirmed => Self {
                confirmed: true,
                detail: None,
            },
            SignOutOutcome::LocalOnly { reason } => Self {
                confirmed: false,
                detail: Some(reason),
            },
        }
    }
}

/// Candidate profile captured at registration.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/profile-request.ts"
)]
pub struct ProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub date_of_birth: Option<String>,
}

impl TryFrom<ProfileRequest> for ProfileFields {
    type Error = AppError;

    fn try_from(request: ProfileRequest) -> Result<Self, Self::Error> {
        Ok(ProfileFields::new(request.first_name, request.last_name)?
            .with_phone(request.phone)
            .with_gender(request.gender)
            .with_location(request.location)
            .with_date_of_birth(request.date_of_birth))
    }
}

/// Incoming payload for candidate registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/register-request.ts"
)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub profile: ProfileRequest,
}

/// Incoming payload to finish this client's partial registration. The user
/// and the pending steps come from the server-side session.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/complete-registration-request.ts"
)]
pub struct CompleteRegistrationRequest {
    pub profile: ProfileRequest,
}

/// Registration outcome. `pending_steps` lists the writes that still have to
/// be completed when `complete` is false.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/registration-response.ts"
)]
pub struct RegistrationResponse {
    pub user_id: String,
    pub email: String,
    pub complete: bool,
    pub pending_steps: Vec<String>,
    pub detail: Option<String>,
}

/// Parses a registration step identifier.
pub fn parse_registration_step(value: &str) -> AppResult<RegistrationStep> {
    RegistrationStep::ALL
        .into_iter()
        .find(|step| step.as_str() == value)
        .ok_or_else(|| AppError::Validation(format!("unknown registration step '{value}'")))
}

/// Job board query parameters.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/job-list-query.ts"
)]
pub struct JobListQuery {
    pub industry: Option<String>,
    pub location: Option<String>,
    pub field: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// API representation of a normalized job.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/job-response.ts"
)]
pub struct JobResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub status: String,
    pub created_at: String,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub field: Option<String>,
    pub deadline: Option<String>,
    pub responsibilities: Option<String>,
}

impl From<NormalizedJob> for JobResponse {
    fn from(job: NormalizedJob) -> Self {
        let overlay = job.overlay();
        Self {
            id: job.id().to_owned(),
            title: job.title().to_owned(),
            description: job.description().to_owned(),
            requirements: job.requirements().to_vec(),
            status: job.status().as_str().to_owned(),
            created_at: job.created_at().to_rfc3339(),
            industry: overlay.industry().map(str::to_owned),
            location: overlay.location().map(str::to_owned),
            field: overlay.field().map(str::to_owned),
            deadline: overlay.deadline().map(str::to_owned),
            responsibilities: overlay.responsibilities().map(str::to_owned),
        }
    }
}

/// Filter choices for the job board.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/job-facets-response.ts"
)]
pub struct JobFacetsResponse {
    pub industries: Vec<String>,
    pub locations: Vec<String>,
    pub fields: Vec<String>,
}

impl From<JobFacets> for JobFacetsResponse {
    fn from(facets: JobFacets) -> Self {
        Self {
            industries: facets.industries,
            locations: facets.locations,
            fields: facets.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CompleteRegistrationRequest, HealthResponse, JobFacetsResponse, JobListQuery,
        JobResponse, ProfileRequest, RegisterRequest, RegistrationResponse, SessionResponse,
        SignInRequest, SignOutResponse, parse_registration_step,
    };

    use crate::error::ErrorResponse;
    use talentdesk_application::RegistrationStep;
    use ts_rs::Config;
    use ts_rs::TS;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        HealthResponse::export(&config)?;
        SessionResponse::export(&config)?;
        SignInRequest::export(&config)?;
        SignOutResponse::export(&config)?;
        ProfileRequest::export(&config)?;
        RegisterRequest::export(&config)?;
        CompleteRegistrationRequest::export(&config)?;
        RegistrationResponse::export(&config)?;
        JobListQuery::export(&config)?;
        JobResponse::export(&config)?;
        JobFacetsResponse::export(&config)?;
        ErrorResponse::export(&config)?;

        Ok(())
    }

    #[test]
    fn registration_steps_parse_from_their_identifiers() {
        assert_eq!(
            parse_registration_step("profile").ok(),
            Some(RegistrationStep::Profile)
        );
        assert_eq!(
            parse_registration_step("role_record").ok(),
            Some(RegistrationStep::RoleRecord)
        );
        assert!(parse_registration_step("billing").is_err());
    }
}
