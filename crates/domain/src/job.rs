//! Job postings and the overlay normalization applied on every fetch.
//!
//! Descriptive job attributes were historically written either as first-class
//! columns or inside a free-form `metadata` blob, and that blob was sometimes
//! stored as JSON text instead of a JSON object. [`JobMetadata`] decodes the
//! blob once at the store boundary; [`normalize`] then merges columns and
//! metadata with a fixed precedence: a non-empty column always wins, a
//! non-empty metadata entry is the fallback, anything else is unspecified.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use talentdesk_core::AppError;

/// Publication status of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Not visible to candidates yet.
    Draft,
    /// Listed on the public job board.
    Published,
    /// No longer accepting applications.
    Closed,
}

impl JobStatus {
    /// Returns the storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "closed" => Ok(Self::Closed),
            _ => Err(AppError::Validation(format!("unknown job status '{value}'"))),
        }
    }
}

/// Descriptive job attribute that may live in a column or in metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayAttribute {
    /// Business sector, e.g. `Information Technology`.
    Industry,
    /// Work location.
    Location,
    /// Profession within the industry.
    Field,
    /// Application deadline as entered (usually `YYYY-MM-DD`).
    Deadline,
    /// Free-text responsibilities.
    Responsibilities,
}

impl OverlayAttribute {
    /// Every overlay attribute, in display order.
    pub const ALL: [Self; 5] = [
        Self::Industry,
        Self::Location,
        Self::Field,
        Self::Deadline,
        Self::Responsibilities,
    ];

    /// Returns the column name and metadata key for the attribute.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Industry => "industry",
            Self::Location => "location",
            Self::Field => "field",
            Self::Deadline => "deadline",
            Self::Responsibilities => "responsibilities",
        }
    }
}

/// Values of the five overlay attributes. Each is either a non-empty string
/// or `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOverlay {
    industry: Option<String>,
    location: Option<String>,
    field: Option<String>,
    deadline: Option<String>,
    responsibilities: Option<String>,
}

impl JobOverlay {
    /// Returns the value of one attribute.
    #[must_use]
    pub fn get(&self, attribute: OverlayAttribute) -> Option<&str> {
        match attribute {
            OverlayAttribute::Industry => self.industry.as_deref(),
            OverlayAttribute::Location => self.location.as_deref(),
            OverlayAttribute::Field => self.field.as_deref(),
            OverlayAttribute::Deadline => self.deadline.as_deref(),
            OverlayAttribute::Responsibilities => self.responsibilities.as_deref(),
        }
    }

    /// Sets one attribute. Empty or whitespace-only values clear it.
    pub fn set(&mut self, attribute: OverlayAttribute, value: Option<String>) {
        let value = value.filter(|value| !value.trim().is_empty());
        match attribute {
            OverlayAttribute::Industry => self.industry = value,
            OverlayAttribute::Location => self.location = value,
            OverlayAttribute::Field => self.field = value,
            OverlayAttribute::Deadline => self.deadline = value,
            OverlayAttribute::Responsibilities => self.responsibilities = value,
        }
    }

    /// Builder form of [`JobOverlay::set`].
    #[must_use]
    pub fn with(mut self, attribute: OverlayAttribute, value: impl Into<String>) -> Self {
        self.set(attribute, Some(value.into()));
        self
    }

    /// Reads the overlay keys of a JSON object. A key whose value is not a
    /// string is treated as absent without affecting the other keys.
    #[must_use]
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut overlay = Self::default();
        for attribute in OverlayAttribute::ALL {
            let value = object
                .get(attribute.key())
                .and_then(Value::as_str)
                .map(str::to_owned);
            overlay.set(attribute, value);
        }
        overlay
    }

    /// Returns the industry.
    #[must_use]
    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    /// Returns the location.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns the field.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the deadline.
    #[must_use]
    pub fn deadline(&self) -> Option<&str> {
        self.deadline.as_deref()
    }

    /// Returns the responsibilities.
    #[must_use]
    pub fn responsibilities(&self) -> Option<&str> {
        self.responsibilities.as_deref()
    }
}

/// Decoded form of a job's `metadata` blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum JobMetadata {
    /// No metadata stored.
    #[default]
    Absent,
    /// Metadata decoded to a mapping; holds its overlay keys.
    Fields(JobOverlay),
    /// Metadata was present but is not a mapping, or is text that does not
    /// parse as one. Contributes nothing to normalization.
    Unreadable,
}

impl JobMetadata {
    /// Decodes a raw metadata value as read from storage.
    ///
    /// Accepts a JSON object, or a string holding a serialized JSON object.
    /// Never fails: anything else decodes to [`JobMetadata::Unreadable`].
    #[must_use]
    pub fn decode(value: &Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::Object(object) => Self::Fields(JobOverlay::from_json_object(object)),
            Value::String(text) if text.trim().is_empty() => Self::Absent,
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(object)) => Self::Fields(JobOverlay::from_json_object(&object)),
                Ok(Value::Null) => Self::Absent,
                Ok(_) | Err(_) => Self::Unreadable,
            },
            Value::Bool(_) | Value::Number(_) | Value::Array(_) => Self::Unreadable,
        }
    }

    /// Decodes an optional raw metadata value.
    #[must_use]
    pub fn decode_optional(value: Option<&Value>) -> Self {
        value.map_or(Self::Absent, Self::decode)
    }

    /// Returns the metadata value of one attribute, if readable.
    #[must_use]
    pub fn get(&self, attribute: OverlayAttribute) -> Option<&str> {
        match self {
            Self::Fields(overlay) => overlay.get(attribute),
            Self::Absent | Self::Unreadable => None,
        }
    }
}

/// A job posting as stored, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawJobRecord {
    id: String,
    title: String,
    description: String,
    requirements: Vec<String>,
    status: JobStatus,
    created_at: DateTime<Utc>,
    columns: JobOverlay,
    metadata: JobMetadata,
}

impl RawJobRecord {
    /// Creates a record with the canonical fields and no overlay data.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        status: JobStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            requirements: Vec::new(),
            status,
            created_at,
            columns: JobOverlay::default(),
            metadata: JobMetadata::Absent,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the requirement list.
    #[must_use]
    pub fn with_requirements(mut self, requirements: Vec<String>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Sets one direct overlay column. `None` and empty values leave the
    /// column unset.
    #[must_use]
    pub fn with_column(mut self, attribute: OverlayAttribute, value: Option<String>) -> Self {
        self.columns.set(attribute, value);
        self
    }

    /// Sets the decoded metadata blob.
    #[must_use]
    pub fn with_metadata(mut self, metadata: JobMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns the record id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the direct overlay columns.
    #[must_use]
    pub fn columns(&self) -> &JobOverlay {
        &self.columns
    }

    /// Returns the decoded metadata.
    #[must_use]
    pub fn metadata(&self) -> &JobMetadata {
        &self.metadata
    }
}

/// A job posting with all overlay attributes resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedJob {
    id: String,
    title: String,
    description: String,
    requirements: Vec<String>,
    status: JobStatus,
    created_at: DateTime<Utc>,
    overlay: JobOverlay,
}

impl NormalizedJob {
    /// Returns the job id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the requirement list.
    #[must_use]
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the resolved overlay attributes.
    #[must_use]
    pub fn overlay(&self) -> &JobOverlay {
        &self.overlay
    }
}

/// Resolves every overlay attribute of a raw record.
///
/// Pure and total. The raw record is left untouched so the transform can be
/// repeated on every fetch.
#[must_use]
pub fn normalize(raw: &RawJobRecord) -> NormalizedJob {
    let mut overlay = JobOverlay::default();
    for attribute in OverlayAttribute::ALL {
        let value = raw
            .columns
            .get(attribute)
            .or_else(|| raw.metadata.get(attribute))
            .map(str::to_owned);
        overlay.set(attribute, value);
    }

    NormalizedJob {
        id: raw.id.clone(),
        title: raw.title.clone(),
        description: raw.description.clone(),
        requirements: raw.requirements.clone(),
        status: raw.status,
        created_at: raw.created_at,
        overlay,
    }
}

/// Normalizes a batch of records. Each record is handled independently.
#[must_use]
pub fn normalize_all(records: &[RawJobRecord]) -> Vec<NormalizedJob> {
    records.iter().map(normalize).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("valid timestamp"))
    }

    fn job(metadata: Value) -> RawJobRecord {
        RawJobRecord::new("job-1", "x", JobStatus::Published, created_at())
            .with_metadata(JobMetadata::decode(&metadata))
    }

    #[test]
    fn metadata_supplies_missing_column() {
        let normalized = normalize(&job(json!({"industry": "Tech"})));
        assert_eq!(normalized.overlay().industry(), Some("Tech"));
    }

    #[test]
    fn empty_column_does_not_shadow_metadata() {
        let raw = job(json!({"industry": "Tech"}))
            .with_column(OverlayAttribute::Industry, Some(String::new()));
        assert_eq!(normalize(&raw).overlay().industry(), Some("Tech"));
    }

    #[test]
    fn populated_column_wins_over_metadata() {
        let raw = job(json!({"industry": "Tech"}))
            .with_column(OverlayAttribute::Industry, Some("Finance".to_owned()));
        assert_eq!(normalize(&raw).overlay().industry(), Some("Finance"));
    }

    #[test]
    fn invalid_metadata_text_leaves_every_attribute_unspecified() {
        let raw = job(json!("not valid json"));
        assert_eq!(raw.metadata(), &JobMetadata::Unreadable);

        let normalized = normalize(&raw);
        for attribute in OverlayAttribute::ALL {
            assert_eq!(normalized.overlay().get(attribute), None);
        }
    }

    #[test]
    fn metadata_stored_as_json_text_is_parsed() {
        let text = json!({"location": "Nairobi", "deadline": "2024-06-30"}).to_string();
        let normalized = normalize(&job(Value::String(text)));
        assert_eq!(normalized.overlay().location(), Some("Nairobi"));
        assert_eq!(normalized.overlay().deadline(), Some("2024-06-30"));
        assert_eq!(normalized.overlay().industry(), None);
    }

    #[test]
    fn non_string_metadata_value_only_drops_that_attribute() {
        let normalized = normalize(&job(json!({"field": 42, "industry": "Health"})));
        assert_eq!(normalized.overlay().field(), None);
        assert_eq!(normalized.overlay().industry(), Some("Health"));
    }

    #[test]
    fn empty_metadata_value_is_unspecified() {
        let normalized = normalize(&job(json!({"industry": ""})));
        assert_eq!(normalized.overlay().industry(), None);
    }

    #[test]
    fn responsibilities_column_wins_over_metadata() {
        let raw = job(json!({"responsibilities": "from metadata"})).with_column(
            OverlayAttribute::Responsibilities,
            Some("from column".to_owned()),
        );
        assert_eq!(
            normalize(&raw).overlay().responsibilities(),
            Some("from column")
        );
    }

    #[test]
    fn non_object_metadata_decodes_as_unreadable() {
        assert_eq!(JobMetadata::decode(&json!([1, 2])), JobMetadata::Unreadable);
        assert_eq!(JobMetadata::decode(&json!("[1, 2]")), JobMetadata::Unreadable);
        assert_eq!(JobMetadata::decode(&json!(true)), JobMetadata::Unreadable);
        assert_eq!(JobMetadata::decode(&Value::Null), JobMetadata::Absent);
        assert_eq!(JobMetadata::decode(&json!("  ")), JobMetadata::Absent);
        assert_eq!(JobMetadata::decode_optional(None), JobMetadata::Absent);
    }

    #[test]
    fn malformed_record_does_not_affect_rest_of_batch() {
        let batch = vec![
            job(json!("{broken")),
            job(json!({"industry": "Retail"})),
        ];
        let normalized = normalize_all(&batch);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].overlay().industry(), None);
        assert_eq!(normalized[1].overlay().industry(), Some("Retail"));
    }

    #[test]
    fn canonical_fields_are_carried_over() {
        let raw = RawJobRecord::new("job-9", "Nurse", JobStatus::Closed, created_at())
            .with_description("Night shifts")
            .with_requirements(vec!["RN license".to_owned()]);
        let normalized = normalize(&raw);
        assert_eq!(normalized.id(), "job-9");
        assert_eq!(normalized.title(), "Nurse");
        assert_eq!(normalized.description(), "Night shifts");
        assert_eq!(normalized.requirements(), ["RN license".to_owned()]);
        assert_eq!(normalized.status(), JobStatus::Closed);
        assert_eq!(normalized.created_at(), created_at());
    }

    #[test]
    fn status_parses_storage_values() {
        assert_eq!("published".parse::<JobStatus>(), Ok(JobStatus::Published));
        assert!("archived".parse::<JobStatus>().is_err());
    }

    proptest! {
        #[test]
        fn prop_non_empty_column_always_wins(
            column in "[A-Za-z]{1,12}",
            metadata in proptest::option::of("[A-Za-z]{0,12}"),
        ) {
            let raw = job(json!({"location": metadata}))
                .with_column(OverlayAttribute::Location, Some(column.clone()));
            let normalized = normalize(&raw);
            prop_assert_eq!(normalized.overlay().location(), Some(column.as_str()));
        }

        #[test]
        fn prop_normalize_never_panics_on_arbitrary_text(text in ".*") {
            let raw = job(Value::String(text));
            let _ = normalize(&raw);
        }

        #[test]
        fn prop_normalize_is_repeatable(industry in proptest::option::of("[A-Za-z ]{0,10}")) {
            let raw = job(json!({"industry": industry}));
            prop_assert_eq!(normalize(&raw), normalize(&raw));
        }
    }
}
