//! Application services and ports.

#![forbid(unsafe_code)]

mod admin_allowlist;
mod auth_ports;
mod job_catalog_service;
mod retry_policy;
mod role_resolver;
mod session_service;

pub use admin_allowlist::AdminAllowlist;
pub use auth_ports::{AuthProvider, ProfileStore, RoleStore, SessionEvent};
pub use job_catalog_service::{JobCatalogService, JobStore};
pub use retry_policy::{RetryExhausted, RetryPolicy};
pub use role_resolver::RoleResolver;
pub use session_service::{
    AuthError, PartialRegistration, RegistrationError, RegistrationStep, SessionPhase,
    SessionService, SessionSnapshot, SignOutOutcome, StepFailure,
};
