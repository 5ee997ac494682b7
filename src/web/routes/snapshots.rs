use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::SnapshotRow;
use crate::services::snapshot_service::{self, SnapshotEntryPage, SnapshotPage};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateSnapshotBody {
    pub description: Option<String>,
}

pub async fn create_snapshot_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
    body: Option<Json<CreateSnapshotBody>>,
) -> AppResult<Json<SnapshotRow>> {
    if !auth_user.is_staff() {
        return Err(AppError::Forbidden);
    }
    let description = body.as_ref().and_then(|b| b.description.as_deref());
    let snapshot = snapshot_service::create_snapshot(
        &state.pool,
        event_id,
        auth_user.id,
        description,
        Utc::now(),
    )
    .await?;
    Ok(Json(snapshot))
}

pub async fn list_snapshots_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<i64>,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> AppResult<Json<SnapshotPage>> {
    if !auth_user.is_staff() {
        return Err(AppError::Forbidden);
    }
    let page =
        snapshot_service::list_snapshots(&state.pool, event_id, query.page, query.page_size).await?;
    Ok(Json(page))
}

pub async fn snapshot_entries_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(snapshot_id): Path<String>,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> AppResult<Json<SnapshotEntryPage>> {
    if !auth_user.is_staff() {
        return Err(AppError::Forbidden);
    }
    let page =
        snapshot_service::snapshot_entries(&state.pool, &snapshot_id, query.page, query.page_size)
            .await?;
    Ok(Json(page))
}

pub async fn delete_snapshot_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(snapshot_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    if !auth_user.is_staff() {
        return Err(AppError::Forbidden);
    }
    snapshot_service::delete_snapshot(&state.pool, &snapshot_id).await?;
    Ok(Json(json!({ "deleted": snapshot_id })))
}
