use axum::extract::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{Value, json};
use talentdesk_application::{AuthProvider, SessionEvent};
use talentdesk_core::{AppError, AppResult};
use url::Url;

use super::{SupabaseAuthProvider, provider_error};

const ANON_KEY: &str = "anon-test-key";

fn has_api_key(headers: &HeaderMap) -> bool {
    headers
        .get("apikey")
        .and_then(|value| value.to_str().ok())
        == Some(ANON_KEY)
}

async fn token(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !has_api_key(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "No API key found in request" })),
        );
    }

    if body.get("password").and_then(Value::as_str) != Some("secret1") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "access_token": "jwt-1",
            "token_type": "bearer",
            "user": { "id": "0b6f-user", "email": "cand@talentdesk.test" }
        })),
    )
}

async fn signup(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body.get("email").and_then(Value::as_str) == Some("taken@talentdesk.test") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "code": 422, "msg": "User already registered" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({ "id": "new-user", "email": body.get("email") })),
    )
}

async fn user(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let bearer = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok());
    if bearer != Some("Bearer jwt-1") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "invalid JWT" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({ "id": "0b6f-user", "email": "cand@talentdesk.test" })),
    )
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn stub_provider() -> SupabaseAuthProvider {
    let router = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/logout", post(logout));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|error| panic!("failed to bind stub listener: {error}"));
    let address = listener
        .local_addr()
        .unwrap_or_else(|error| panic!("stub listener has no address: {error}"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    let base_url = Url::parse(&format!("http://{address}/"))
        .unwrap_or_else(|error| panic!("invalid stub url: {error}"));
    SupabaseAuthProvider::new(reqwest::Client::new(), base_url, ANON_KEY)
}

#[tokio::test]
async fn sign_in_caches_session_and_broadcasts() -> AppResult<()> {
    let provider = stub_provider().await;
    let mut events = provider.subscribe();

    let identity = provider.sign_in("cand@talentdesk.test", "secret1").await?;

    assert_eq!(identity.user_id(), "0b6f-user");
    assert_eq!(identity.session_token(), "jwt-1");
    assert_eq!(events.try_recv().ok(), Some(SessionEvent::Active(identity.clone())));
    assert_eq!(provider.current_session().await?, Some(identity));
    Ok(())
}

#[tokio::test]
async fn rejected_sign_in_surfaces_provider_message() {
    let provider = stub_provider().await;

    let result = provider.sign_in("cand@talentdesk.test", "wrong").await;

    assert_eq!(
        result,
        Err(AppError::Provider("Invalid login credentials".to_owned()))
    );
}

#[tokio::test]
async fn sign_up_accepts_bare_user_response() -> AppResult<()> {
    let provider = stub_provider().await;

    let identity = provider.sign_up("new@talentdesk.test", "secret1").await?;
    assert_eq!(identity.user_id(), "new-user");
    assert_eq!(identity.email(), "new@talentdesk.test");

    let taken = provider.sign_up("taken@talentdesk.test", "secret1").await;
    assert_eq!(
        taken,
        Err(AppError::Provider("User already registered".to_owned()))
    );
    Ok(())
}

#[tokio::test]
async fn sign_out_clears_cached_session() -> AppResult<()> {
    let provider = stub_provider().await;
    provider.sign_in("cand@talentdesk.test", "secret1").await?;
    let mut events = provider.subscribe();

    provider.sign_out().await?;

    assert_eq!(events.try_recv().ok(), Some(SessionEvent::Ended));
    assert_eq!(provider.current_session().await?, None);
    Ok(())
}

#[test]
fn provider_error_prefers_body_message_and_classifies_status() {
    assert_eq!(
        provider_error(StatusCode::BAD_REQUEST, r#"{"msg":"Email not confirmed"}"#),
        AppError::Provider("Email not confirmed".to_owned())
    );
    assert_eq!(
        provider_error(StatusCode::UNAUTHORIZED, r#"{"message":"expired"}"#),
        AppError::Unauthorized("expired".to_owned())
    );
    assert!(matches!(
        provider_error(StatusCode::BAD_GATEWAY, "<html>"),
        AppError::Unavailable(_)
    ));
}
