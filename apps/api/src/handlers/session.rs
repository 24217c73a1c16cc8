use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use talentdesk_application::{RegistrationError, SignOutOutcome};
use talentdesk_core::{AppError, Identity};
use talentdesk_domain::ProfileFields;
use tower_sessions::Session;
use tracing::info;

use crate::client_session::{
    PendingRegistration, attach_client_key, clear_pending_registration, client_key,
    current_snapshot, pending_registration, store_pending_registration,
};
use crate::dto::{
    CompleteRegistrationRequest, RegisterRequest, RegistrationResponse, SessionResponse,
    SignInRequest, SignOutResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn session_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<SessionResponse>> {
    let snapshot = current_snapshot(&state, &session).await?;
    Ok(Json(SessionResponse::from(&snapshot)))
}

pub async fn sign_in_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<SignInRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let service = state.sessions.start().await?;
    if let Err(error) = service.sign_in(&payload.email, &payload.password).await {
        service.dispose().await;
        return Err(error.into());
    }

    let previous = client_key(&session).await?;
    let key = state.sessions.track(service.clone()).await;
    attach_client_key(&session, key).await?;

    let replaced = match previous {
        Some(previous) => state.sessions.release(previous).await,
        None => None,
    };
    if let Some(replaced) = replaced {
        replaced.sign_out().await;
        replaced.dispose().await;
        info!("previous client session replaced by new sign-in");
    }

    Ok(Json(SessionResponse::from(&service.snapshot())))
}

pub async fn sign_out_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<SignOutResponse>> {
    let service = match client_key(&session).await? {
        Some(key) => state.sessions.release(key).await,
        None => None,
    };

    let outcome = match service {
        Some(service) => {
            let outcome = service.sign_out().await;
            service.dispose().await;
            outcome
        }
        None => SignOutOutcome::Confirmed,
    };

    session
        .flush()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(Json(SignOutResponse::from(outcome)))
}

pub async fn register_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegistrationResponse>)> {
    let profile = ProfileFields::try_from(payload.profile)?;

    let service = state.sessions.start().await?;
    let result = service
        .register(&payload.email, &payload.password, &profile)
        .await;
    service.dispose().await;

    match result {
        Ok(identity) => {
            clear_pending_registration(&session).await?;
            Ok((
                StatusCode::CREATED,
                Json(completed_registration(&identity)),
            ))
        }
        Err(error) => partial_registration(&session, error).await,
    }
}

/// Finishes the registration this client left incomplete. Only the user
/// recorded in the caller's own session can be completed.
pub async fn complete_registration_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CompleteRegistrationRequest>,
) -> ApiResult<(StatusCode, Json<RegistrationResponse>)> {
    let Some(pending) = pending_registration(&session).await? else {
        return Err(
            AppError::Unauthorized("no pending registration for this session".to_owned()).into(),
        );
    };
    let profile = ProfileFields::try_from(payload.profile)?;
    let steps = pending.steps()?;
    let identity = pending.identity();

    let service = state.sessions.start().await?;
    let result = service
        .complete_registration(&identity, &steps, &profile)
        .await;
    service.dispose().await;

    match result {
        Ok(()) => {
            clear_pending_registration(&session).await?;
            Ok((StatusCode::OK, Json(completed_registration(&identity))))
        }
        Err(error) => partial_registration(&session, error).await,
    }
}

fn completed_registration(identity: &Identity) -> RegistrationResponse {
    RegistrationResponse {
        user_id: identity.user_id().to_owned(),
        email: identity.email().to_owned(),
        complete: true,
        pending_steps: Vec::new(),
        detail: None,
    }
}

/// A partial registration is reported as accepted work, not as a failure:
/// the account exists and this client can finish the pending steps.
async fn partial_registration(
    session: &Session,
    error: RegistrationError,
) -> ApiResult<(StatusCode, Json<RegistrationResponse>)> {
    let partial = match error {
        RegistrationError::Partial(partial) => partial,
        RegistrationError::Auth(error) => return Err(error.into()),
    };

    let detail = partial.to_string();
    let pending = PendingRegistration::new(partial.identity(), &partial.pending_steps());
    store_pending_registration(session, &pending).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(RegistrationResponse {
            user_id: pending.user_id,
            email: pending.email,
            complete: false,
            pending_steps: pending.pending_steps,
            detail: Some(detail),
        }),
    ))
}
