//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod job;
mod job_query;
mod security;
mod user;

pub use job::{
    JobMetadata, JobOverlay, JobStatus, NormalizedJob, OverlayAttribute, RawJobRecord, normalize,
    normalize_all,
};
pub use job_query::{JobFacets, JobQuery, JobSortField, SortDirection};
pub use security::Role;
pub use user::{
    EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, ProfileFields, validate_password,
};
