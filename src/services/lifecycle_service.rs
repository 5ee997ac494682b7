use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::database::{event_repo, participation_repo};
use crate::database::participation_repo::NewParticipation;
use crate::error::AppResult;
use crate::models::EventRow;
use crate::services::participation_service::{end_of_day_utc, mint_unique_join_code};

/// Mints today's join code for every pre-registered user of every live
/// multi-day event. Safe to run more than once per day: users who already
/// hold a row for today are skipped, and the (user, event, day) unique index
/// backstops concurrent runs.
pub async fn run_unlock_pass(pool: &SqlitePool, now: DateTime<Utc>) -> AppResult<u64> {
    let today = now.date_naive();
    let events = event_repo::list_active_multi_day(pool, today).await?;
    if events.is_empty() {
        debug!(%today, "unlock pass: no live multi-day events");
        return Ok(0);
    }

    let mut minted = 0u64;
    for event in &events {
        let user_ids = participation_repo::list_preregistered_user_ids(pool, event.id).await?;
        let mut event_minted = 0u64;
        for user_id in user_ids {
            match unlock_for_user(pool, event, user_id, now).await {
                Ok(true) => event_minted += 1,
                Ok(false) => {}
                // One bad row must not block the rest of the pass.
                Err(err) => warn!(
                    event_id = event.id,
                    user_id,
                    error = %err,
                    "unlock pass: skipping user"
                ),
            }
        }
        if event_minted > 0 {
            info!(event_id = event.id, minted = event_minted, %today, "unlock pass: codes issued");
        }
        minted += event_minted;
    }
    Ok(minted)
}

async fn unlock_for_user(
    pool: &SqlitePool,
    event: &EventRow,
    user_id: i64,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    let today = now.date_naive();
    if participation_repo::has_row_for_day(pool, user_id, event.id, today).await? {
        return Ok(false);
    }
    if let Some(cap) = event.max_checkins_per_user {
        let issued = participation_repo::count_non_cancelled(pool, user_id, event.id).await?;
        if issued >= cap {
            return Ok(false);
        }
    }

    let code = mint_unique_join_code(pool).await?;
    participation_repo::insert_participation(
        pool,
        NewParticipation {
            user_id,
            event_id: event.id,
            join_code: &code,
            checkin_date: Some(today),
            code_expires_at: Some(end_of_day_utc(today)),
            pre_registered: true,
        },
        now,
    )
    .await?;
    Ok(true)
}

/// Flips every unused, overdue join code to expired in one statement.
/// Idempotent: an expired row no longer matches the predicate.
pub async fn run_expire_pass(pool: &SqlitePool, now: DateTime<Utc>) -> AppResult<u64> {
    let expired = participation_repo::expire_overdue(pool, now).await?;
    if expired > 0 {
        info!(expired, "expire pass: overdue codes closed");
    } else {
        debug!("expire pass: nothing overdue");
    }
    Ok(expired)
}
