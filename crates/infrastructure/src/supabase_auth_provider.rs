//! Supabase (GoTrue) authentication provider.
//!
//! Talks to the hosted auth REST API and keeps the session it obtained in
//! memory. Session changes made through this adapter are broadcast to every
//! subscriber.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use talentdesk_application::{AuthProvider, SessionEvent};
use talentdesk_core::{AppError, AppResult, Identity};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};
use url::Url;

const EVENT_BUFFER: usize = 32;

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    user: GoTrueUser,
}

/// Sign-up answers with a session when email confirmation is disabled and
/// with the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(GoTrueSession),
    User(GoTrueUser),
}

/// [`AuthProvider`] backed by the Supabase auth REST API.
pub struct SupabaseAuthProvider {
    http_client: reqwest::Client,
    base_url: Url,
    anon_key: String,
    current: Mutex<Option<Identity>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseAuthProvider {
    /// Creates a provider for the project at `base_url`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: Url, anon_key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            http_client,
            base_url,
            anon_key: anon_key.into(),
            current: Mutex::new(None),
            events,
        }
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url.join(path).map_err(|error| {
            AppError::Internal(format!("invalid auth endpoint '{path}': {error}"))
        })
    }

    fn password_grant_endpoint(&self) -> AppResult<Url> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        let response = request
            .header("apikey", self.anon_key.as_str())
            .send()
            .await
            .map_err(|error| AppError::Unavailable(format!("auth provider unreachable: {error}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(provider_error(status, body.as_str()))
    }

    fn broadcast(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        let url = self.password_grant_endpoint()?;
        let response = self
            .send(
                self.http_client
                    .post(url)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;

        let session: GoTrueSession = response
            .json()
            .await
            .map_err(|error| AppError::Internal(format!("invalid sign-in response: {error}")))?;
        let identity = identity_from_session(session, email);

        *self.current.lock().await = Some(identity.clone());
        self.broadcast(SessionEvent::Active(identity.clone()));
        debug!(user_id = %identity.user_id(), "supabase sign-in");

        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<Identity> {
        let url = self.endpoint("auth/v1/signup")?;
        let response = self
            .send(
                self.http_client
                    .post(url)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;

        let created: SignUpResponse = response
            .json()
            .await
            .map_err(|error| AppError::Internal(format!("invalid sign-up response: {error}")))?;

        Ok(match created {
            SignUpResponse::Session(session) => identity_from_session(session, email),
            SignUpResponse::User(user) => {
                let email = user.email.unwrap_or_else(|| email.to_owned());
                Identity::new(String::new(), user.id, email)
            }
        })
    }

    async fn sign_out(&self) -> AppResult<()> {
        let Some(identity) = self.current.lock().await.take() else {
            return Ok(());
        };
        self.broadcast(SessionEvent::Ended);

        let url = self.endpoint("auth/v1/logout")?;
        self.send(
            self.http_client
                .post(url)
                .bearer_auth(identity.session_token()),
        )
        .await
        .map(|_| ())
    }

    async fn current_session(&self) -> AppResult<Option<Identity>> {
        let Some(cached) = self.current.lock().await.clone() else {
            return Ok(None);
        };

        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .send(self.http_client.get(url).bearer_auth(cached.session_token()))
            .await;

        match response {
            Ok(response) => {
                let user: GoTrueUser = response.json().await.map_err(|error| {
                    AppError::Internal(format!("invalid user response: {error}"))
                })?;
                let email = user.email.unwrap_or_else(|| cached.email().to_owned());
                Ok(Some(Identity::new(cached.session_token(), user.id, email)))
            }
            Err(AppError::Unauthorized(message)) => {
                warn!(message = %message, "stored session rejected by provider");
                *self.current.lock().await = None;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

fn identity_from_session(session: GoTrueSession, fallback_email: &str) -> Identity {
    let email = session
        .user
        .email
        .unwrap_or_else(|| fallback_email.trim().to_lowercase());
    Identity::new(session.access_token, session.user.id, email)
}

/// Maps a failed response to an error carrying the provider's own message.
fn provider_error(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_owned))
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("auth provider returned status {status}"));

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        AppError::Unavailable(message)
    } else if status == StatusCode::UNAUTHORIZED {
        AppError::Unauthorized(message)
    } else {
        AppError::Provider(message)
    }
}

#[cfg(test)]
mod tests;
