use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::ParticipationRow;
use crate::services::checkin_service;
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct CheckinForm {
    pub join_code: String,
}

pub async fn check_in_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Json(form): Json<CheckinForm>,
) -> AppResult<Json<ParticipationRow>> {
    if !auth_user.is_staff() {
        return Err(AppError::Forbidden);
    }
    let code = form.join_code.trim();
    if code.is_empty() {
        return Err(AppError::CodeNotFound);
    }

    match checkin_service::check_in(&state.pool, auth_user.id, code, Utc::now()).await {
        Ok(row) => Ok(Json(row)),
        Err(err) => {
            warn!(staff_user_id = auth_user.id, error = %err, "check-in rejected");
            Err(err)
        }
    }
}
