use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::database::participation_repo;
use crate::error::{AppError, AppResult};
use crate::models::{ParticipationRow, ParticipationStatus};

/// Redeems a join code on behalf of staff. Each code works exactly once;
/// a code presented after its expiry instant is flipped to expired on the
/// spot rather than waiting for the nightly pass.
pub async fn check_in(
    pool: &SqlitePool,
    staff_user_id: i64,
    join_code: &str,
    now: DateTime<Utc>,
) -> AppResult<ParticipationRow> {
    let row = participation_repo::load_by_code(pool, join_code)
        .await?
        .ok_or(AppError::CodeNotFound)?;

    if row.code_used != 0 {
        return Err(AppError::CodeAlreadyUsed);
    }
    match row.parsed_status() {
        Some(ParticipationStatus::Joined) => {}
        Some(ParticipationStatus::Expired) => return Err(AppError::CodeExpired),
        _ => return Err(AppError::InvalidTransition(row.status.clone())),
    }
    if row.is_code_expired(now) {
        participation_repo::mark_expired(pool, row.id, now).await?;
        return Err(AppError::CodeExpired);
    }

    let updated = participation_repo::mark_checked_in(pool, row.id, staff_user_id, now).await?;
    if updated == 0 {
        // Someone redeemed or expired this code between our read and the
        // guarded update.
        return Err(AppError::ConflictingUpdate);
    }

    info!(
        participation_id = row.id,
        user_id = row.user_id,
        event_id = row.event_id,
        staff_user_id,
        "participant checked in"
    );
    participation_repo::load_by_id(pool, row.id)
        .await?
        .ok_or(AppError::NotFound("participation"))
}

/// Closes out a checked-in participation.
pub async fn complete(
    pool: &SqlitePool,
    staff_user_id: i64,
    participation_id: i64,
    now: DateTime<Utc>,
) -> AppResult<ParticipationRow> {
    let row = participation_repo::load_by_id(pool, participation_id)
        .await?
        .ok_or(AppError::NotFound("participation"))?;
    if row.parsed_status() != Some(ParticipationStatus::CheckedIn) {
        return Err(AppError::InvalidTransition(row.status.clone()));
    }

    let updated = participation_repo::mark_completed(pool, participation_id, staff_user_id, now).await?;
    if updated == 0 {
        return Err(AppError::ConflictingUpdate);
    }
    participation_repo::load_by_id(pool, participation_id)
        .await?
        .ok_or(AppError::NotFound("participation"))
}
