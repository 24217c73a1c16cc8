//! PostgreSQL-backed role and profile stores.

use async_trait::async_trait;
use sqlx::PgPool;

use talentdesk_application::{ProfileStore, RoleStore};
use talentdesk_core::{AppError, AppResult};
use talentdesk_domain::{ProfileFields, Role};

/// PostgreSQL implementation of the role store port.
#[derive(Clone)]
pub struct PostgresRoleStore {
    pool: PgPool,
}

impl PostgresRoleStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PostgresRoleStore {
    async fn get_role(&self, user_id: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM user_roles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to load user role: {error}")))
    }

    async fn create_role(&self, user_id: &str, role: Role) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to save user role: {error}")))?;

        Ok(result.rows_affected() == 1)
    }
}

/// PostgreSQL implementation of the profile store port.
#[derive(Clone)]
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn create_profile(
        &self,
        user_id: &str,
        email: &str,
        fields: &ProfileFields,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                user_id, email, first_name, last_name, phone, gender, location, date_of_birth
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(fields.first_name())
        .bind(fields.last_name())
        .bind(fields.phone())
        .bind(fields.gender())
        .bind(fields.location())
        .bind(fields.date_of_birth())
        .execute(&self.pool)
        .await
        .map_err(|error| profile_conflict_or_unavailable(error, user_id))?;

        Ok(())
    }
}

fn profile_conflict_or_unavailable(error: sqlx::Error, user_id: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("profile for user '{user_id}' already exists"));
    }

    AppError::Unavailable(format!("failed to create profile: {error}"))
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;
    use talentdesk_application::{ProfileStore, RoleStore};
    use talentdesk_core::AppError;
    use talentdesk_domain::{ProfileFields, Role};
    use uuid::Uuid;

    use super::{PostgresProfileStore, PostgresRoleStore};

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for postgres user store tests: {error}");
        }

        Some(pool)
    }

    #[tokio::test]
    async fn role_insert_keeps_existing_record() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let store = PostgresRoleStore::new(pool);
        let user_id = Uuid::new_v4().to_string();

        assert_eq!(store.get_role(&user_id).await, Ok(None));
        assert_eq!(store.create_role(&user_id, Role::Admin).await, Ok(true));
        assert_eq!(store.create_role(&user_id, Role::Member).await, Ok(false));
        assert_eq!(store.get_role(&user_id).await, Ok(Some("admin".to_owned())));
    }

    #[tokio::test]
    async fn duplicate_profile_is_a_conflict() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let store = PostgresProfileStore::new(pool);
        let user_id = Uuid::new_v4().to_string();
        let fields = ProfileFields::new("Grace", "Hopper")
            .unwrap_or_else(|error| panic!("valid profile: {error}"))
            .with_location(Some("Arlington".to_owned()));

        let first = store
            .create_profile(&user_id, "grace@talentdesk.test", &fields)
            .await;
        let second = store
            .create_profile(&user_id, "grace@talentdesk.test", &fields)
            .await;

        assert!(first.is_ok());
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }
}
