//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_auth_provider;
mod in_memory_stores;
mod postgres_job_store;
mod postgres_user_stores;
mod supabase_auth_provider;

pub use in_memory_auth_provider::InMemoryAuthProvider;
pub use in_memory_stores::{InMemoryJobStore, InMemoryProfileStore, InMemoryRoleStore, StoredProfile};
pub use postgres_job_store::PostgresJobStore;
pub use postgres_user_stores::{PostgresProfileStore, PostgresRoleStore};
pub use supabase_auth_provider::SupabaseAuthProvider;

/// Embedded schema migrations for the PostgreSQL stores.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
