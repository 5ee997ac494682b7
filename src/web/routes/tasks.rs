use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::services::lifecycle_service;
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

/// Manual trigger for the unlock pass, for operators catching up after an
/// outage. Idempotent like the scheduled run.
pub async fn run_unlock_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    if !auth_user.is_staff() {
        return Err(AppError::Forbidden);
    }
    let minted = lifecycle_service::run_unlock_pass(&state.pool, Utc::now()).await?;
    Ok(Json(json!({ "minted": minted })))
}

pub async fn run_expire_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Value>> {
    if !auth_user.is_staff() {
        return Err(AppError::Forbidden);
    }
    let expired = lifecycle_service::run_expire_pass(&state.pool, Utc::now()).await?;
    Ok(Json(json!({ "expired": expired })))
}
