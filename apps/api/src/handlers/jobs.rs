use axum::Json;
use axum::extract::{Query, State};
use talentdesk_core::AppResult;
use talentdesk_domain::{JobQuery, JobSortField, SortDirection};
use tower_sessions::Session;

use crate::client_session::current_snapshot;
use crate::dto::{JobFacetsResponse, JobListQuery, JobResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_published_jobs_handler(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> ApiResult<Json<Vec<JobResponse>>> {
    let query = job_query(params)?;
    let jobs = state
        .job_catalog_service
        .list_published(&query)
        .await?
        .into_iter()
        .map(JobResponse::from)
        .collect();

    Ok(Json(jobs))
}

/// Lists jobs of every status. The role comes from the caller's own session.
pub async fn list_all_jobs_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<JobResponse>>> {
    let role = current_snapshot(&state, &session).await?.role();
    let jobs = state
        .job_catalog_service
        .list_jobs(role)
        .await?
        .into_iter()
        .map(JobResponse::from)
        .collect();

    Ok(Json(jobs))
}

pub async fn job_facets_handler(State(state): State<AppState>) -> ApiResult<Json<JobFacetsResponse>> {
    let facets = state.job_catalog_service.facets().await?;
    Ok(Json(JobFacetsResponse::from(facets)))
}

fn job_query(params: JobListQuery) -> AppResult<JobQuery> {
    let sort_field = params
        .sort
        .as_deref()
        .map(str::parse::<JobSortField>)
        .transpose()?
        .unwrap_or_default();
    let direction = params
        .order
        .as_deref()
        .map(str::parse::<SortDirection>)
        .transpose()?;

    Ok(JobQuery::new()
        .industry(params.industry)
        .location(params.location)
        .field(params.field)
        .search(params.search)
        .sort(sort_field, direction))
}
