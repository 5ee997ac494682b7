use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::{event_repo, participation_repo};
use crate::error::{AppError, AppResult};
use crate::models::{EventRow, ParticipationRow, RosterRow};
use crate::services::participation_service::{self, DailyCheckinStats, PreRegistrationStatus};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

pub async fn event_detail_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    let event: EventRow = event_repo::load_event(&state.pool, event_id)
        .await?
        .ok_or(AppError::NotFound("event"))?;
    let participant_count = event_repo::count_active_participants(&state.pool, event_id).await?;
    Ok(Json(json!({
        "event": event,
        "participant_count": participant_count,
    })))
}

pub async fn join_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<Json<ParticipationRow>> {
    let row = participation_service::join(
        &state.pool,
        state.policy,
        auth_user.id,
        event_id,
        Utc::now(),
    )
    .await?;
    Ok(Json(row))
}

pub async fn pre_register_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<Json<ParticipationRow>> {
    let row =
        participation_service::pre_register(&state.pool, auth_user.id, event_id, Utc::now()).await?;
    Ok(Json(row))
}

#[derive(Debug, Deserialize, Default)]
pub struct CancelPreRegistrationBody {
    pub reason: Option<String>,
}

pub async fn cancel_pre_registration_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
    body: Option<Json<CancelPreRegistrationBody>>,
) -> AppResult<Json<Value>> {
    let reason = body.as_ref().and_then(|b| b.reason.as_deref());
    let cancelled = participation_service::cancel_pre_registration(
        &state.pool,
        auth_user.id,
        event_id,
        reason,
        Utc::now(),
    )
    .await?;
    Ok(Json(json!({ "cancelled": cancelled })))
}

pub async fn pre_registration_status_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<Json<PreRegistrationStatus>> {
    let status = participation_service::pre_registration_status(
        &state.pool,
        auth_user.id,
        event_id,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(status))
}

/// Staff-only roster of every participation row on an event.
pub async fn event_participations_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RosterRow>>> {
    if !auth_user.is_staff() {
        return Err(AppError::Forbidden);
    }
    event_repo::load_event(&state.pool, event_id)
        .await?
        .ok_or(AppError::NotFound("event"))?;
    let roster = participation_repo::list_event_roster(&state.pool, event_id).await?;
    Ok(Json(roster))
}

pub async fn checkin_stats_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<Json<DailyCheckinStats>> {
    let stats = participation_service::daily_checkin_stats(
        &state.pool,
        auth_user.id,
        event_id,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(stats))
}
