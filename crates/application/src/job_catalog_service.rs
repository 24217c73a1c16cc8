//! Job catalog read service.
//!
//! Every record leaving the store goes through [`normalize`], so callers
//! never see which of the two overlay sources a value came from.

use std::sync::Arc;

use async_trait::async_trait;
use talentdesk_core::{AppError, AppResult};
use talentdesk_domain::{
    JobFacets, JobQuery, JobStatus, NormalizedJob, RawJobRecord, Role, normalize_all,
};
use tracing::debug;

/// Port for stored job postings.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Lists raw records, optionally restricted to one status.
    async fn list_jobs(&self, status: Option<JobStatus>) -> AppResult<Vec<RawJobRecord>>;
}

/// Application service for job listings.
#[derive(Clone)]
pub struct JobCatalogService {
    job_store: Arc<dyn JobStore>,
}

impl JobCatalogService {
    /// Creates a catalog service.
    #[must_use]
    pub fn new(job_store: Arc<dyn JobStore>) -> Self {
        Self { job_store }
    }

    /// Lists every job regardless of status. Only administrators may see
    /// drafts and closed postings.
    pub async fn list_jobs(&self, role: Option<Role>) -> AppResult<Vec<NormalizedJob>> {
        if !role.is_some_and(|role| role.is_admin()) {
            return Err(AppError::Forbidden(
                "listing unpublished jobs requires the admin role".to_owned(),
            ));
        }

        let records = self.job_store.list_jobs(None).await?;
        Ok(normalize_all(&records))
    }

    /// Lists published jobs filtered and sorted by `query`.
    pub async fn list_published(&self, query: &JobQuery) -> AppResult<Vec<NormalizedJob>> {
        let jobs = self.published().await?;
        let total = jobs.len();
        let jobs = query.apply(jobs);
        debug!(total, matched = jobs.len(), "listed published jobs");
        Ok(jobs)
    }

    /// Returns filter choices drawn from the published jobs.
    pub async fn facets(&self) -> AppResult<JobFacets> {
        let jobs = self.published().await?;
        Ok(JobFacets::collect(&jobs))
    }

    async fn published(&self) -> AppResult<Vec<NormalizedJob>> {
        let records = self.job_store.list_jobs(Some(JobStatus::Published)).await?;
        Ok(normalize_all(&records))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use talentdesk_core::{AppError, AppResult};
    use talentdesk_domain::{
        JobMetadata, JobQuery, JobSortField, JobStatus, OverlayAttribute, RawJobRecord, Role,
    };

    use super::{JobCatalogService, JobStore};

    struct FakeJobStore {
        records: Vec<RawJobRecord>,
    }

    #[async_trait]
    impl JobStore for FakeJobStore {
        async fn list_jobs(&self, status: Option<JobStatus>) -> AppResult<Vec<RawJobRecord>> {
            Ok(self
                .records
                .iter()
                .filter(|record| status.is_none_or(|status| record.status() == status))
                .cloned()
                .collect())
        }
    }

    fn record(id: &str, title: &str, status: JobStatus, day: u32) -> RawJobRecord {
        let created_at = Utc
            .with_ymd_and_hms(2024, 5, day, 8, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("valid timestamp"));
        RawJobRecord::new(id, title, status, created_at)
    }

    fn service() -> JobCatalogService {
        let records = vec![
            record("job-1", "Backend Engineer", JobStatus::Published, 1)
                .with_column(OverlayAttribute::Industry, Some("Technology".to_owned()))
                .with_metadata(JobMetadata::decode(&json!({
                    "industry": "Finance",
                    "location": "Berlin"
                }))),
            record("job-2", "Nurse", JobStatus::Published, 2).with_metadata(
                JobMetadata::decode(&json!(
                    "{\"industry\":\"Healthcare\",\"location\":\"Lisbon\"}"
                )),
            ),
            record("job-3", "Analyst", JobStatus::Draft, 3)
                .with_column(OverlayAttribute::Industry, Some("Finance".to_owned())),
        ];

        JobCatalogService::new(Arc::new(FakeJobStore { records }))
    }

    #[tokio::test]
    async fn published_listing_is_normalized_and_newest_first() -> AppResult<()> {
        let jobs = service().list_published(&JobQuery::new()).await?;

        let ids: Vec<&str> = jobs.iter().map(|job| job.id()).collect();
        assert_eq!(ids, vec!["job-2", "job-1"]);
        assert_eq!(jobs[0].overlay().industry(), Some("Healthcare"));
        assert_eq!(jobs[1].overlay().industry(), Some("Technology"));
        assert_eq!(jobs[1].overlay().location(), Some("Berlin"));
        Ok(())
    }

    #[tokio::test]
    async fn published_listing_applies_filters_and_sort() -> AppResult<()> {
        let query = JobQuery::new()
            .location(Some("Berlin".to_owned()))
            .sort(JobSortField::Title, None);
        let jobs = service().list_published(&query).await?;

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id(), "job-1");
        Ok(())
    }

    #[tokio::test]
    async fn full_listing_requires_admin() -> AppResult<()> {
        let service = service();

        let denied = service.list_jobs(Some(Role::Member)).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));
        let anonymous = service.list_jobs(None).await;
        assert!(matches!(anonymous, Err(AppError::Forbidden(_))));

        let jobs = service.list_jobs(Some(Role::Admin)).await?;
        assert_eq!(jobs.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn facets_only_cover_published_jobs() -> AppResult<()> {
        let facets = service().facets().await?;

        assert_eq!(facets.industries, vec!["Healthcare", "Technology"]);
        assert_eq!(facets.locations, vec!["Berlin", "Lisbon"]);
        assert!(facets.fields.is_empty());
        Ok(())
    }
}
