//! PostgreSQL-backed job store.
//!
//! The `metadata` column is JSONB but legacy rows hold a JSON string with a
//! serialized object inside; both shapes are decoded here, once, into
//! [`JobMetadata`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use talentdesk_application::JobStore;
use talentdesk_core::{AppError, AppResult};
use talentdesk_domain::{JobMetadata, JobStatus, OverlayAttribute, RawJobRecord};

/// PostgreSQL implementation of the job store port.
#[derive(Clone)]
pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: uuid::Uuid,
    title: String,
    description: String,
    requirements: Vec<String>,
    status: String,
    industry: Option<String>,
    location: Option<String>,
    field: Option<String>,
    deadline: Option<String>,
    responsibilities: Option<String>,
    metadata: Option<Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for RawJobRecord {
    type Error = AppError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<JobStatus>().map_err(|_| {
            AppError::Internal(format!(
                "job '{}' has unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(
            RawJobRecord::new(row.id.to_string(), row.title, status, row.created_at)
                .with_description(row.description)
                .with_requirements(row.requirements)
                .with_column(OverlayAttribute::Industry, row.industry)
                .with_column(OverlayAttribute::Location, row.location)
                .with_column(OverlayAttribute::Field, row.field)
                .with_column(OverlayAttribute::Deadline, row.deadline)
                .with_column(OverlayAttribute::Responsibilities, row.responsibilities)
                .with_metadata(JobMetadata::decode_optional(row.metadata.as_ref())),
        )
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn list_jobs(&self, status: Option<JobStatus>) -> AppResult<Vec<RawJobRecord>> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, title, description, requirements, status, industry, location,
                   field, deadline, responsibilities, metadata, created_at
            FROM jobs
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(|status| status.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to list jobs: {error}")))?;

        rows.into_iter().map(RawJobRecord::try_from).collect()
    }
}
