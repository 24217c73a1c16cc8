use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use talentdesk_core::AppError;

use crate::NormalizedJob;

/// Sort direction for job listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }
}

/// Sortable job listing columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSortField {
    /// Posting time.
    #[default]
    CreatedAt,
    /// Job title, case-insensitive.
    Title,
    /// Application deadline; jobs without one always sort last.
    Deadline,
}

impl JobSortField {
    /// Newest first for timestamps, A to Z for text.
    #[must_use]
    pub fn default_direction(&self) -> SortDirection {
        match self {
            Self::CreatedAt => SortDirection::Desc,
            Self::Title | Self::Deadline => SortDirection::Asc,
        }
    }
}

impl FromStr for JobSortField {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created_at" => Ok(Self::CreatedAt),
            "title" => Ok(Self::Title),
            "deadline" => Ok(Self::Deadline),
            _ => Err(AppError::Validation(format!("unknown sort field '{value}'"))),
        }
    }
}

/// Filter, search and sort options for a job board listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    industry: Option<String>,
    location: Option<String>,
    field: Option<String>,
    search: Option<String>,
    sort_field: JobSortField,
    sort_direction: Option<SortDirection>,
}

impl JobQuery {
    /// Creates a query matching every job, newest first.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one industry. Empty or `all` clears the filter.
    #[must_use]
    pub fn industry(mut self, value: Option<String>) -> Self {
        self.industry = filter_value(value);
        self
    }

    /// Restricts to one location. Empty or `all` clears the filter.
    #[must_use]
    pub fn location(mut self, value: Option<String>) -> Self {
        self.location = filter_value(value);
        self
    }

    /// Restricts to one field. Empty or `all` clears the filter.
    #[must_use]
    pub fn field(mut self, value: Option<String>) -> Self {
        self.field = filter_value(value);
        self
    }

    /// Sets the free-text search term.
    #[must_use]
    pub fn search(mut self, value: Option<String>) -> Self {
        self.search = value
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());
        self
    }

    /// Sets the sort column and, optionally, an explicit direction.
    #[must_use]
    pub fn sort(mut self, field: JobSortField, direction: Option<SortDirection>) -> Self {
        self.sort_field = field;
        self.sort_direction = direction;
        self
    }

    /// Returns the effective sort direction.
    #[must_use]
    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
            .unwrap_or_else(|| self.sort_field.default_direction())
    }

    /// Returns whether one job passes every filter and the search term.
    #[must_use]
    pub fn matches(&self, job: &NormalizedJob) -> bool {
        let overlay = job.overlay();
        exact(self.industry.as_deref(), overlay.industry())
            && exact(self.location.as_deref(), overlay.location())
            && exact(self.field.as_deref(), overlay.field())
            && self.matches_search(job)
    }

    /// Filters and sorts a listing.
    #[must_use]
    pub fn apply(&self, jobs: Vec<NormalizedJob>) -> Vec<NormalizedJob> {
        let mut jobs: Vec<NormalizedJob> =
            jobs.into_iter().filter(|job| self.matches(job)).collect();
        let direction = self.sort_direction();
        jobs.sort_by(|left, right| self.compare(left, right, direction));
        jobs
    }

    fn matches_search(&self, job: &NormalizedJob) -> bool {
        let Some(term) = self.search.as_deref() else {
            return true;
        };

        let overlay = job.overlay();
        [
            Some(job.title()),
            Some(job.description()),
            overlay.responsibilities(),
            overlay.industry(),
            overlay.location(),
            overlay.field(),
        ]
        .into_iter()
        .flatten()
        .any(|text| text.to_lowercase().contains(term))
    }

    fn compare(
        &self,
        left: &NormalizedJob,
        right: &NormalizedJob,
        direction: SortDirection,
    ) -> Ordering {
        let ordering = match self.sort_field {
            JobSortField::CreatedAt => left.created_at().cmp(&right.created_at()),
            JobSortField::Title => left
                .title()
                .to_lowercase()
                .cmp(&right.title().to_lowercase()),
            JobSortField::Deadline => {
                match (left.overlay().deadline(), right.overlay().deadline()) {
                    (Some(left), Some(right)) => left.cmp(right),
                    (Some(_), None) => return Ordering::Less,
                    (None, Some(_)) => return Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
        };

        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

fn filter_value(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
}

fn exact(filter: Option<&str>, value: Option<&str>) -> bool {
    filter.is_none_or(|filter| value == Some(filter))
}

/// Distinct overlay values offered as filter choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobFacets {
    /// Sorted distinct industries.
    pub industries: Vec<String>,
    /// Sorted distinct locations.
    pub locations: Vec<String>,
    /// Sorted distinct fields.
    pub fields: Vec<String>,
}

impl JobFacets {
    /// Collects facets from normalized jobs.
    #[must_use]
    pub fn collect(jobs: &[NormalizedJob]) -> Self {
        let mut industries = BTreeSet::new();
        let mut locations = BTreeSet::new();
        let mut fields = BTreeSet::new();

        for job in jobs {
            let overlay = job.overlay();
            industries.extend(overlay.industry().map(str::to_owned));
            locations.extend(overlay.location().map(str::to_owned));
            fields.extend(overlay.field().map(str::to_owned));
        }

        Self {
            industries: industries.into_iter().collect(),
            locations: locations.into_iter().collect(),
            fields: fields.into_iter().collect(),
        }
    }
}
