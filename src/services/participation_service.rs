use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::database::{event_repo, participation_repo};
use crate::database::participation_repo::NewParticipation;
use crate::error::{AppError, AppResult};
use crate::models::{EventRow, ParticipationRow, ParticipationStatus};
use crate::state::LifecyclePolicy;

const JOIN_CODE_LEN: usize = 5;
const JOIN_CODE_ATTEMPTS: usize = 64;

/// Mints a join code that no current row holds. The code space is small by
/// design (participants read it to staff), so collisions are retried against
/// the unique index.
pub async fn mint_unique_join_code(pool: &SqlitePool) -> AppResult<String> {
    for _ in 0..JOIN_CODE_ATTEMPTS {
        let code: String = {
            let mut rng = rand::thread_rng();
            (0..JOIN_CODE_LEN)
                .map(|_| char::from(b'0' + rng.gen_range(0u8..10)))
                .collect()
        };
        if !participation_repo::code_exists(pool, &code).await? {
            return Ok(code);
        }
    }
    Err(AppError::Database(sqlx::Error::Protocol(
        "join code space exhausted".into(),
    )))
}

/// Day codes lapse at the end of their calendar day (UTC).
pub fn end_of_day_utc(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(23, 59, 59)
        .expect("23:59:59 is a valid wall-clock time")
        .and_utc()
}

pub async fn join(
    pool: &SqlitePool,
    policy: LifecyclePolicy,
    user_id: i64,
    event_id: i64,
    now: DateTime<Utc>,
) -> AppResult<ParticipationRow> {
    let event = event_repo::load_event(pool, event_id)
        .await?
        .ok_or(AppError::NotFound("event"))?;
    if !event.is_open() {
        return Err(AppError::EventNotOpen);
    }

    if event.is_multi_day() {
        return join_daily(pool, &event, user_id, now).await;
    }

    if let Some(existing) = participation_repo::load_single_day(pool, user_id, event_id).await? {
        return match existing.parsed_status() {
            Some(ParticipationStatus::Cancelled) => {
                reactivate(pool, policy, &existing, now).await
            }
            _ => Err(AppError::AlreadyJoined),
        };
    }

    ensure_capacity(pool, &event).await?;

    let code = mint_unique_join_code(pool).await?;
    let id = participation_repo::insert_participation(
        pool,
        NewParticipation {
            user_id,
            event_id,
            join_code: &code,
            checkin_date: None,
            code_expires_at: None,
            pre_registered: false,
        },
        now,
    )
    .await?;
    load_required(pool, id).await
}

/// Re-entry after a cancel revives the same row: history keeps its identity
/// and the old code is gone for good.
async fn reactivate(
    pool: &SqlitePool,
    policy: LifecyclePolicy,
    existing: &ParticipationRow,
    now: DateTime<Utc>,
) -> AppResult<ParticipationRow> {
    let code = mint_unique_join_code(pool).await?;
    let updated = participation_repo::reactivate_cancelled(
        pool,
        existing.user_id,
        existing.event_id,
        &code,
        policy.rejoin_resets_checkin_count,
        now,
    )
    .await?;
    if updated == 0 {
        // Another request revived or replaced the row between our read and
        // the guarded update.
        return Err(AppError::ConflictingUpdate);
    }
    load_required(pool, existing.id).await
}

/// One row per day for multi-day events; the guarded insert plus the
/// (user, event, day) unique index keep double submissions out.
async fn join_daily(
    pool: &SqlitePool,
    event: &EventRow,
    user_id: i64,
    now: DateTime<Utc>,
) -> AppResult<ParticipationRow> {
    let today = now.date_naive();
    if !event.contains_day(today) {
        return Err(AppError::EventNotOpen);
    }
    if participation_repo::has_row_for_day(pool, user_id, event.id, today).await? {
        return Err(AppError::AlreadyJoined);
    }
    ensure_under_checkin_cap(pool, event, user_id).await?;
    if !participation_repo::has_active(pool, user_id, event.id).await? {
        ensure_capacity(pool, event).await?;
    }

    let code = mint_unique_join_code(pool).await?;
    let id = participation_repo::insert_participation(
        pool,
        NewParticipation {
            user_id,
            event_id: event.id,
            join_code: &code,
            checkin_date: Some(today),
            code_expires_at: Some(end_of_day_utc(today)),
            pre_registered: false,
        },
        now,
    )
    .await?;
    load_required(pool, id).await
}

pub async fn cancel(
    pool: &SqlitePool,
    actor_user_id: i64,
    actor_is_staff: bool,
    participation_id: i64,
    reason: &str,
    now: DateTime<Utc>,
) -> AppResult<ParticipationRow> {
    let row = participation_repo::load_by_id(pool, participation_id)
        .await?
        .ok_or(AppError::NotFound("participation"))?;
    if row.user_id != actor_user_id && !actor_is_staff {
        return Err(AppError::Forbidden);
    }
    match row.parsed_status() {
        Some(status) if status.can_cancel() => {}
        _ => return Err(AppError::InvalidTransition(row.status.clone())),
    }

    let updated = participation_repo::cancel(pool, participation_id, reason, now).await?;
    if updated == 0 {
        return Err(AppError::ConflictingUpdate);
    }
    load_required(pool, participation_id).await
}

/// One-time signup that authorizes automatic daily code issuance. The first
/// day's code is minted on the spot so the participant leaves with something
/// usable.
pub async fn pre_register(
    pool: &SqlitePool,
    user_id: i64,
    event_id: i64,
    now: DateTime<Utc>,
) -> AppResult<ParticipationRow> {
    let event = event_repo::load_event(pool, event_id)
        .await?
        .ok_or(AppError::NotFound("event"))?;
    if !event.is_multi_day() {
        return Err(AppError::NotMultiDayEvent);
    }
    if !event.is_open() {
        return Err(AppError::EventNotOpen);
    }
    if participation_repo::has_active(pool, user_id, event_id).await? {
        return Err(AppError::AlreadyPreRegistered);
    }

    let today = now.date_naive();
    if today > event.end_date() {
        return Err(AppError::EventNotOpen);
    }
    let first_day = event.start_date().max(today);

    ensure_capacity(pool, &event).await?;

    let code = mint_unique_join_code(pool).await?;
    let id = participation_repo::insert_participation(
        pool,
        NewParticipation {
            user_id,
            event_id,
            join_code: &code,
            checkin_date: Some(first_day),
            code_expires_at: Some(end_of_day_utc(first_day)),
            pre_registered: true,
        },
        now,
    )
    .await?;
    load_required(pool, id).await
}

/// Cancels every unused day code of a pre-registration. Rows whose codes were
/// already used stay untouched as attendance history.
pub async fn cancel_pre_registration(
    pool: &SqlitePool,
    user_id: i64,
    event_id: i64,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<u64> {
    let reason = reason.unwrap_or("cancelled by participant");
    let cancelled =
        participation_repo::cancel_unused_daily(pool, user_id, event_id, reason, now).await?;
    if cancelled == 0 {
        return Err(AppError::NotFound("cancellable join code"));
    }
    Ok(cancelled)
}

#[derive(Debug, Serialize)]
pub struct TodayCode {
    pub code: String,
    pub date: NaiveDate,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PreRegistrationStatus {
    pub is_registered: bool,
    pub total_codes: usize,
    pub active_codes: usize,
    pub used_codes: usize,
    pub expired_codes: usize,
    pub today_code: Option<TodayCode>,
}

pub async fn pre_registration_status(
    pool: &SqlitePool,
    user_id: i64,
    event_id: i64,
    today: NaiveDate,
) -> AppResult<PreRegistrationStatus> {
    let rows = participation_repo::list_daily_for_user_event(pool, user_id, event_id).await?;
    let rows: Vec<_> = rows
        .into_iter()
        .filter(|r| r.parsed_status() != Some(ParticipationStatus::Cancelled))
        .collect();

    if rows.is_empty() {
        return Ok(PreRegistrationStatus {
            is_registered: false,
            total_codes: 0,
            active_codes: 0,
            used_codes: 0,
            expired_codes: 0,
            today_code: None,
        });
    }

    let mut active_codes = 0;
    let mut used_codes = 0;
    let mut expired_codes = 0;
    let mut today_code = None;

    for row in &rows {
        match row.parsed_status() {
            Some(ParticipationStatus::Joined) if row.code_used == 0 => {
                if row.checkin_date == Some(today) {
                    active_codes += 1;
                    if today_code.is_none() {
                        if let Some(code) = row.join_code.clone() {
                            today_code = Some(TodayCode {
                                code,
                                date: today,
                                expires_at: row.code_expires_at,
                            });
                        }
                    }
                }
            }
            Some(ParticipationStatus::Expired) => expired_codes += 1,
            Some(ParticipationStatus::CheckedIn) | Some(ParticipationStatus::Completed) => {
                used_codes += 1
            }
            _ => {
                if row.code_used != 0 {
                    used_codes += 1;
                }
            }
        }
    }

    Ok(PreRegistrationStatus {
        is_registered: true,
        total_codes: rows.len(),
        active_codes,
        used_codes,
        expired_codes,
        today_code,
    })
}

#[derive(Debug, Serialize)]
pub struct CheckinCalendarDay {
    pub date: Option<NaiveDate>,
    pub join_code: Option<String>,
    pub status: String,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub code_used: bool,
}

#[derive(Debug, Serialize)]
pub struct DailyCheckinStats {
    pub user_id: i64,
    pub event_id: i64,
    pub total_days_registered: usize,
    pub total_days_checked_in: usize,
    pub total_days_expired: usize,
    pub current_streak: u32,
    pub calendar: Vec<CheckinCalendarDay>,
}

pub async fn daily_checkin_stats(
    pool: &SqlitePool,
    user_id: i64,
    event_id: i64,
    today: NaiveDate,
) -> AppResult<DailyCheckinStats> {
    let rows = participation_repo::list_daily_for_user_event(pool, user_id, event_id).await?;
    let rows: Vec<_> = rows
        .into_iter()
        .filter(|r| r.parsed_status() != Some(ParticipationStatus::Cancelled))
        .collect();

    let total_days_registered = rows.len();
    let total_days_checked_in = rows
        .iter()
        .filter(|r| {
            matches!(
                r.parsed_status(),
                Some(ParticipationStatus::CheckedIn) | Some(ParticipationStatus::Completed)
            )
        })
        .count();
    let total_days_expired = rows
        .iter()
        .filter(|r| r.parsed_status() == Some(ParticipationStatus::Expired))
        .count();

    // Rows come back newest-first; walk backwards day by day from today.
    let mut current_streak = 0u32;
    let mut expected = today;
    for row in &rows {
        let Some(day) = row.checkin_date else {
            continue;
        };
        if day == expected {
            current_streak += 1;
            expected = expected - Duration::days(1);
        } else if day < expected {
            break;
        }
    }

    let calendar = rows
        .iter()
        .map(|r| CheckinCalendarDay {
            date: r.checkin_date,
            join_code: r.join_code.clone(),
            status: r.status.clone(),
            checked_in_at: r.checked_in_at,
            code_used: r.code_used != 0,
        })
        .collect();

    Ok(DailyCheckinStats {
        user_id,
        event_id,
        total_days_registered,
        total_days_checked_in,
        total_days_expired,
        current_streak,
        calendar,
    })
}

async fn ensure_capacity(pool: &SqlitePool, event: &EventRow) -> AppResult<()> {
    let Some(max) = event.max_participants else {
        return Ok(());
    };
    let current = event_repo::count_active_participants(pool, event.id).await?;
    if current >= max {
        return Err(AppError::EventFull);
    }
    Ok(())
}

async fn ensure_under_checkin_cap(
    pool: &SqlitePool,
    event: &EventRow,
    user_id: i64,
) -> AppResult<()> {
    let Some(cap) = event.max_checkins_per_user else {
        return Ok(());
    };
    let issued = participation_repo::count_non_cancelled(pool, user_id, event.id).await?;
    if issued >= cap {
        return Err(AppError::CheckinLimitReached);
    }
    Ok(())
}

async fn load_required(pool: &SqlitePool, participation_id: i64) -> AppResult<ParticipationRow> {
    participation_repo::load_by_id(pool, participation_id)
        .await?
        .ok_or(AppError::NotFound("participation"))
}
