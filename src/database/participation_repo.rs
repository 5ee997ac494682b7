use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::models::{ParticipationRow, RosterRow};

const PARTICIPATION_COLUMNS: &str = r#"
  id,
  user_id,
  event_id,
  join_code,
  status,
  checkin_date,
  code_used,
  code_expires_at,
  pre_registered,
  checkin_count,
  checked_in_by,
  checked_in_at,
  completed_by,
  completed_at,
  cancellation_reason,
  cancelled_at,
  joined_at,
  updated_at
"#;

fn select_sql(where_clause: &str) -> String {
    format!("SELECT {PARTICIPATION_COLUMNS} FROM event_participations {where_clause}")
}

pub async fn load_by_id(
    pool: &SqlitePool,
    participation_id: i64,
) -> sqlx::Result<Option<ParticipationRow>> {
    sqlx::query_as::<_, ParticipationRow>(&select_sql("WHERE id = ? LIMIT 1"))
        .bind(participation_id)
        .fetch_optional(pool)
        .await
}

/// Only rows currently holding a code match: cancel clears `join_code`, so a
/// hit is always the active holder.
pub async fn load_by_code(
    pool: &SqlitePool,
    join_code: &str,
) -> sqlx::Result<Option<ParticipationRow>> {
    sqlx::query_as::<_, ParticipationRow>(&select_sql("WHERE join_code = ? LIMIT 1"))
        .bind(join_code)
        .fetch_optional(pool)
        .await
}

pub async fn code_exists(pool: &SqlitePool, join_code: &str) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM event_participations WHERE join_code = ?",
    )
    .bind(join_code)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<ParticipationRow>> {
    sqlx::query_as::<_, ParticipationRow>(&select_sql(
        "WHERE user_id = ? ORDER BY joined_at DESC, id DESC",
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_event(pool: &SqlitePool, event_id: i64) -> sqlx::Result<Vec<ParticipationRow>> {
    sqlx::query_as::<_, ParticipationRow>(&select_sql(
        "WHERE event_id = ? ORDER BY joined_at DESC, id DESC",
    ))
    .bind(event_id)
    .fetch_all(pool)
    .await
}

/// The single-day row for (user, event), whatever its status. Daily rows for
/// multi-day events have `checkin_date` set and are out of scope here.
pub async fn load_single_day(
    pool: &SqlitePool,
    user_id: i64,
    event_id: i64,
) -> sqlx::Result<Option<ParticipationRow>> {
    sqlx::query_as::<_, ParticipationRow>(&select_sql(
        "WHERE user_id = ? AND event_id = ? AND checkin_date IS NULL ORDER BY id DESC LIMIT 1",
    ))
    .bind(user_id)
    .bind(event_id)
    .fetch_optional(pool)
    .await
}

pub async fn has_active(pool: &SqlitePool, user_id: i64, event_id: i64) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
SELECT COUNT(*)
FROM event_participations
WHERE user_id = ? AND event_id = ? AND status <> 'cancelled'
"#,
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn has_row_for_day(
    pool: &SqlitePool,
    user_id: i64,
    event_id: i64,
    day: NaiveDate,
) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
SELECT COUNT(*)
FROM event_participations
WHERE user_id = ? AND event_id = ? AND checkin_date = ? AND status <> 'cancelled'
"#,
    )
    .bind(user_id)
    .bind(event_id)
    .bind(day)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Every non-cancelled row counts toward `max_checkins_per_user`, including
/// expired day codes: an issued-but-wasted code still consumed a day.
pub async fn count_non_cancelled(
    pool: &SqlitePool,
    user_id: i64,
    event_id: i64,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
SELECT COUNT(*)
FROM event_participations
WHERE user_id = ? AND event_id = ? AND status <> 'cancelled'
"#,
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_one(pool)
    .await
}

pub async fn list_preregistered_user_ids(
    pool: &SqlitePool,
    event_id: i64,
) -> sqlx::Result<Vec<i64>> {
    sqlx::query_scalar::<_, i64>(
        r#"
SELECT DISTINCT user_id
FROM event_participations
WHERE event_id = ? AND pre_registered = 1 AND status <> 'cancelled'
ORDER BY user_id
"#,
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
}

pub async fn list_daily_for_user_event(
    pool: &SqlitePool,
    user_id: i64,
    event_id: i64,
) -> sqlx::Result<Vec<ParticipationRow>> {
    sqlx::query_as::<_, ParticipationRow>(&select_sql(
        "WHERE user_id = ? AND event_id = ? AND checkin_date IS NOT NULL ORDER BY checkin_date DESC",
    ))
    .bind(user_id)
    .bind(event_id)
    .fetch_all(pool)
    .await
}

const SQL_EVENT_ROSTER: &str = r#"
SELECT
  p.id AS participation_id,
  p.user_id,
  u.name AS user_name,
  u.email AS user_email,
  p.status,
  p.join_code,
  p.checkin_date,
  p.code_used,
  p.pre_registered,
  p.checkin_count,
  p.cancellation_reason,
  p.joined_at,
  p.checked_in_at,
  p.completed_at,
  p.cancelled_at
FROM event_participations p
JOIN users u ON u.id = p.user_id
WHERE p.event_id = ?
ORDER BY p.joined_at, p.id
"#;

pub async fn list_event_roster(pool: &SqlitePool, event_id: i64) -> sqlx::Result<Vec<RosterRow>> {
    sqlx::query_as::<_, RosterRow>(SQL_EVENT_ROSTER)
        .bind(event_id)
        .fetch_all(pool)
        .await
}

const SQL_INSERT_PARTICIPATION: &str = r#"
INSERT INTO event_participations (
  user_id,
  event_id,
  join_code,
  status,
  checkin_date,
  code_used,
  code_expires_at,
  pre_registered,
  joined_at,
  updated_at
) VALUES (?, ?, ?, 'joined', ?, 0, ?, ?, ?, ?)
"#;

pub struct NewParticipation<'a> {
    pub user_id: i64,
    pub event_id: i64,
    pub join_code: &'a str,
    pub checkin_date: Option<NaiveDate>,
    pub code_expires_at: Option<DateTime<Utc>>,
    pub pre_registered: bool,
}

pub async fn insert_participation(
    pool: &SqlitePool,
    new: NewParticipation<'_>,
    now: DateTime<Utc>,
) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_PARTICIPATION)
        .bind(new.user_id)
        .bind(new.event_id)
        .bind(new.join_code)
        .bind(new.checkin_date)
        .bind(new.code_expires_at)
        .bind(new.pre_registered as i64)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

// Guarded transitions. Each statement matches the expected prior status, so a
// losing concurrent writer observes zero rows affected instead of clobbering
// the winner's update.

const SQL_REACTIVATE_CANCELLED: &str = r#"
UPDATE event_participations
SET status = 'joined',
    join_code = ?,
    code_used = 0,
    code_expires_at = NULL,
    cancellation_reason = NULL,
    cancelled_at = NULL,
    checkin_count = CASE WHEN ? THEN 0 ELSE checkin_count END,
    joined_at = ?,
    updated_at = ?
WHERE user_id = ?
  AND event_id = ?
  AND checkin_date IS NULL
  AND status = 'cancelled'
"#;

/// Reactivates the cancelled single-day row in place: same identity, fresh
/// code, cancellation fields cleared.
pub async fn reactivate_cancelled(
    pool: &SqlitePool,
    user_id: i64,
    event_id: i64,
    join_code: &str,
    reset_checkin_count: bool,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_REACTIVATE_CANCELLED)
        .bind(join_code)
        .bind(reset_checkin_count as i64)
        .bind(now)
        .bind(now)
        .bind(user_id)
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_CANCEL: &str = r#"
UPDATE event_participations
SET status = 'cancelled',
    join_code = NULL,
    code_used = 0,
    code_expires_at = NULL,
    cancellation_reason = ?,
    cancelled_at = ?,
    updated_at = ?
WHERE id = ?
  AND status IN ('joined', 'checked_in')
"#;

pub async fn cancel(
    pool: &SqlitePool,
    participation_id: i64,
    reason: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_CANCEL)
        .bind(reason)
        .bind(now)
        .bind(now)
        .bind(participation_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_CANCEL_UNUSED_DAILY: &str = r#"
UPDATE event_participations
SET status = 'cancelled',
    join_code = NULL,
    code_used = 0,
    code_expires_at = NULL,
    cancellation_reason = ?,
    cancelled_at = ?,
    updated_at = ?
WHERE user_id = ?
  AND event_id = ?
  AND status = 'joined'
  AND code_used = 0
"#;

/// Cancels every unused day code for a pre-registration. Used codes keep
/// their history.
pub async fn cancel_unused_daily(
    pool: &SqlitePool,
    user_id: i64,
    event_id: i64,
    reason: &str,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_CANCEL_UNUSED_DAILY)
        .bind(reason)
        .bind(now)
        .bind(now)
        .bind(user_id)
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_MARK_CHECKED_IN: &str = r#"
UPDATE event_participations
SET status = 'checked_in',
    code_used = 1,
    checkin_count = checkin_count + 1,
    checked_in_by = ?,
    checked_in_at = ?,
    updated_at = ?
WHERE id = ?
  AND status = 'joined'
  AND code_used = 0
"#;

pub async fn mark_checked_in(
    pool: &SqlitePool,
    participation_id: i64,
    staff_id: i64,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_CHECKED_IN)
        .bind(staff_id)
        .bind(now)
        .bind(now)
        .bind(participation_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_MARK_COMPLETED: &str = r#"
UPDATE event_participations
SET status = 'completed',
    completed_by = ?,
    completed_at = ?,
    updated_at = ?
WHERE id = ?
  AND status = 'checked_in'
"#;

pub async fn mark_completed(
    pool: &SqlitePool,
    participation_id: i64,
    staff_id: i64,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_COMPLETED)
        .bind(staff_id)
        .bind(now)
        .bind(now)
        .bind(participation_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_MARK_EXPIRED: &str = r#"
UPDATE event_participations
SET status = 'expired',
    updated_at = ?
WHERE id = ?
  AND status = 'joined'
  AND code_used = 0
"#;

pub async fn mark_expired(
    pool: &SqlitePool,
    participation_id: i64,
    now: DateTime<Utc>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_MARK_EXPIRED)
        .bind(now)
        .bind(participation_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_EXPIRE_OVERDUE: &str = r#"
UPDATE event_participations
SET status = 'expired',
    updated_at = ?
WHERE status = 'joined'
  AND code_used = 0
  AND code_expires_at IS NOT NULL
  AND code_expires_at <= ?
"#;

/// Batch transition for the expire pass. The status filter makes re-runs
/// no-ops, and each row moves independently, so a crash mid-statement leaves
/// nothing half-updated for the next run to trip over.
pub async fn expire_overdue(pool: &SqlitePool, now: DateTime<Utc>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_EXPIRE_OVERDUE)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
