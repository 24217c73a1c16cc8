use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use talentdesk_application::{AdminAllowlist, RetryPolicy};
use talentdesk_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub supabase_url: Url,
    pub supabase_anon_key: String,
    pub admin_allowlist: AdminAllowlist,
    pub frontend_url: String,
    pub cookie_secure: bool,
    pub api_host: String,
    pub api_port: u16,
    pub registration_retry: RetryPolicy,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_non_empty_env("DATABASE_URL")?;
        let supabase_url = required_non_empty_env("SUPABASE_URL")?;
        let supabase_url = Url::parse(supabase_url.as_str())
            .map_err(|error| AppError::Validation(format!("invalid SUPABASE_URL: {error}")))?;
        let supabase_anon_key = required_non_empty_env("SUPABASE_ANON_KEY")?;

        let admin_allowlist = AdminAllowlist::parse(
            env::var("ADMIN_EMAILS").unwrap_or_default().as_str(),
        )
        .map_err(|error| AppError::Validation(format!("invalid ADMIN_EMAILS: {error}")))?;

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let max_attempts = env::var("REGISTRATION_MAX_ATTEMPTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let backoff_ms = env::var("REGISTRATION_BACKOFF_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(200);

        Ok(Self {
            migrate_only,
            database_url,
            supabase_url,
            supabase_anon_key,
            admin_allowlist,
            frontend_url,
            cookie_secure,
            api_host,
            api_port,
            registration_retry: RetryPolicy::new(max_attempts, Duration::from_millis(backoff_ms)),
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
