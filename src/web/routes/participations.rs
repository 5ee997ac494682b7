use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::database::participation_repo;
use crate::error::{AppError, AppResult};
use crate::models::ParticipationRow;
use crate::services::{checkin_service, participation_service};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

pub async fn my_participations_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ParticipationRow>>> {
    let rows = participation_repo::list_by_user(&state.pool, auth_user.id).await?;
    Ok(Json(rows))
}

pub async fn participation_detail_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(participation_id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<Json<ParticipationRow>> {
    let row = participation_repo::load_by_id(&state.pool, participation_id)
        .await?
        .ok_or(AppError::NotFound("participation"))?;
    if row.user_id != auth_user.id && !auth_user.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(Json(row))
}

#[derive(Debug, Deserialize, Default)]
pub struct CancelBody {
    pub reason: Option<String>,
}

pub async fn cancel_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(participation_id): Path<i64>,
    State(state): State<AppState>,
    body: Option<Json<CancelBody>>,
) -> AppResult<Json<ParticipationRow>> {
    let reason = body
        .as_ref()
        .and_then(|b| b.reason.as_deref())
        .unwrap_or("cancelled by participant");
    let row = participation_service::cancel(
        &state.pool,
        auth_user.id,
        auth_user.is_staff(),
        participation_id,
        reason,
        Utc::now(),
    )
    .await?;
    Ok(Json(row))
}

pub async fn complete_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(participation_id): Path<i64>,
    State(state): State<AppState>,
) -> AppResult<Json<ParticipationRow>> {
    if !auth_user.is_staff() {
        return Err(AppError::Forbidden);
    }
    let row =
        checkin_service::complete(&state.pool, auth_user.id, participation_id, Utc::now()).await?;
    Ok(Json(row))
}
