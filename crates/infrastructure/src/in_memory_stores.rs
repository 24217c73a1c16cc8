//! In-memory role, profile and job stores.

use std::collections::HashMap;

use async_trait::async_trait;
use talentdesk_application::{JobStore, ProfileStore, RoleStore};
use talentdesk_core::{AppError, AppResult};
use talentdesk_domain::{JobStatus, ProfileFields, RawJobRecord, Role};
use tokio::sync::RwLock;

/// In-memory role record store.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    roles: RwLock<HashMap<String, String>>,
}

impl InMemoryRoleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn get_role(&self, user_id: &str) -> AppResult<Option<String>> {
        Ok(self.roles.read().await.get(user_id).cloned())
    }

    async fn create_role(&self, user_id: &str, role: Role) -> AppResult<bool> {
        let mut roles = self.roles.write().await;
        if roles.contains_key(user_id) {
            return Ok(false);
        }

        roles.insert(user_id.to_owned(), role.as_str().to_owned());
        Ok(true)
    }
}

/// Stored profile row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProfile {
    /// Email the profile was created with.
    pub email: String,
    /// Profile fields.
    pub fields: ProfileFields,
}

/// In-memory candidate profile store.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, StoredProfile>>,
}

impl InMemoryProfileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the profile of a user.
    pub async fn find(&self, user_id: &str) -> Option<StoredProfile> {
        self.profiles.read().await.get(user_id).cloned()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn create_profile(
        &self,
        user_id: &str,
        email: &str,
        fields: &ProfileFields,
    ) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(user_id) {
            return Err(AppError::Conflict(format!(
                "profile for user '{user_id}' already exists"
            )));
        }

        profiles.insert(
            user_id.to_owned(),
            StoredProfile {
                email: email.to_owned(),
                fields: fields.clone(),
            },
        );
        Ok(())
    }
}

/// In-memory job store seeded with raw records.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    records: RwLock<Vec<RawJobRecord>>,
}

impl InMemoryJobStore {
    /// Creates a store holding `records`.
    #[must_use]
    pub fn new(records: Vec<RawJobRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Appends a record.
    pub async fn insert(&self, record: RawJobRecord) {
        self.records.write().await.push(record);
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn list_jobs(&self, status: Option<JobStatus>) -> AppResult<Vec<RawJobRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|record| status.is_none_or(|status| record.status() == status))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use talentdesk_application::{JobStore, ProfileStore, RoleStore};
    use talentdesk_core::{AppError, AppResult};
    use talentdesk_domain::{JobStatus, ProfileFields, RawJobRecord, Role};

    use super::{InMemoryJobStore, InMemoryProfileStore, InMemoryRoleStore};

    #[tokio::test]
    async fn existing_role_record_is_never_overwritten() -> AppResult<()> {
        let store = InMemoryRoleStore::new();
        assert_eq!(store.get_role("u-1").await?, None);

        assert!(store.create_role("u-1", Role::Admin).await?);
        assert!(!store.create_role("u-1", Role::Member).await?);

        assert_eq!(store.get_role("u-1").await?, Some("admin".to_owned()));
        Ok(())
    }

    #[tokio::test]
    async fn second_profile_for_same_user_conflicts() -> AppResult<()> {
        let store = InMemoryProfileStore::new();
        let fields = ProfileFields::new("Grace", "Hopper")?;

        store
            .create_profile("u-1", "grace@talentdesk.test", &fields)
            .await?;
        let again = store
            .create_profile("u-1", "grace@talentdesk.test", &fields)
            .await;

        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert_eq!(
            store.find("u-1").await.map(|profile| profile.email),
            Some("grace@talentdesk.test".to_owned())
        );
        Ok(())
    }

    #[tokio::test]
    async fn job_listing_filters_by_status() -> AppResult<()> {
        let store = InMemoryJobStore::default();
        store
            .insert(RawJobRecord::new("j-1", "Chef", JobStatus::Published, Utc::now()))
            .await;
        store
            .insert(RawJobRecord::new("j-2", "Baker", JobStatus::Closed, Utc::now()))
            .await;

        assert_eq!(store.list_jobs(None).await?.len(), 2);
        let published = store.list_jobs(Some(JobStatus::Published)).await?;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id(), "j-1");
        Ok(())
    }
}
