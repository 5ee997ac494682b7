use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::models::EventRow;

const EVENT_COLUMNS: &str = r#"
  id,
  title,
  event_type,
  event_date,
  event_end_date,
  max_participants,
  max_checkins_per_user,
  is_active,
  is_published,
  created_by
"#;

pub async fn load_event(pool: &SqlitePool, event_id: i64) -> sqlx::Result<Option<EventRow>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ? LIMIT 1");
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(event_id)
        .fetch_optional(pool)
        .await
}

/// Multi-day events whose date range contains `day` and that are live.
/// Feeds the unlock pass.
pub async fn list_active_multi_day(pool: &SqlitePool, day: NaiveDate) -> sqlx::Result<Vec<EventRow>> {
    let sql = format!(
        r#"
SELECT {EVENT_COLUMNS}
FROM events
WHERE event_type = 'multi_day'
  AND is_active = 1
  AND is_published = 1
  AND event_date <= ?
  AND COALESCE(event_end_date, event_date) >= ?
ORDER BY id
"#
    );
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(day)
        .bind(day)
        .fetch_all(pool)
        .await
}

const SQL_COUNT_ACTIVE_PARTICIPANTS: &str = r#"
SELECT COUNT(DISTINCT user_id)
FROM event_participations
WHERE event_id = ?
  AND status <> 'cancelled'
"#;

/// Distinct users with any non-cancelled participation; multi-day events hold
/// one row per day, so counting rows would overstate attendance.
pub async fn count_active_participants(pool: &SqlitePool, event_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_ACTIVE_PARTICIPANTS)
        .bind(event_id)
        .fetch_one(pool)
        .await
}
