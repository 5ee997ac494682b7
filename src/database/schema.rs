use sqlx::SqlitePool;

const SQL_CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  email TEXT,
  role TEXT NOT NULL DEFAULT 'participant'
)
"#;

const SQL_CREATE_EVENTS: &str = r#"
CREATE TABLE IF NOT EXISTS events (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  event_type TEXT NOT NULL DEFAULT 'single_day',
  event_date TEXT NOT NULL,
  event_end_date TEXT,
  max_participants INTEGER,
  max_checkins_per_user INTEGER,
  is_active INTEGER NOT NULL DEFAULT 1,
  is_published INTEGER NOT NULL DEFAULT 0,
  created_by INTEGER REFERENCES users(id)
)
"#;

const SQL_CREATE_PARTICIPATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS event_participations (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL REFERENCES users(id),
  event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
  join_code TEXT,
  status TEXT NOT NULL DEFAULT 'joined',
  checkin_date TEXT,
  code_used INTEGER NOT NULL DEFAULT 0,
  code_expires_at TEXT,
  pre_registered INTEGER NOT NULL DEFAULT 0,
  checkin_count INTEGER NOT NULL DEFAULT 0,
  checked_in_by INTEGER REFERENCES users(id),
  checked_in_at TEXT,
  completed_by INTEGER REFERENCES users(id),
  completed_at TEXT,
  cancellation_reason TEXT,
  cancelled_at TEXT,
  joined_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
)
"#;

const SQL_CREATE_SNAPSHOTS: &str = r#"
CREATE TABLE IF NOT EXISTS participant_snapshots (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  snapshot_id TEXT NOT NULL UNIQUE,
  event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
  snapshot_time TEXT NOT NULL,
  entry_count INTEGER NOT NULL DEFAULT 0,
  created_by INTEGER REFERENCES users(id),
  description TEXT
)
"#;

const SQL_CREATE_SNAPSHOT_ENTRIES: &str = r#"
CREATE TABLE IF NOT EXISTS participant_snapshot_entries (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  entry_id TEXT NOT NULL UNIQUE,
  snapshot_id INTEGER NOT NULL REFERENCES participant_snapshots(id) ON DELETE CASCADE,
  participation_id INTEGER,
  user_id INTEGER NOT NULL,
  user_name TEXT NOT NULL,
  user_email TEXT,
  status TEXT NOT NULL,
  joined_at TEXT,
  checked_in_at TEXT,
  completed_at TEXT,
  detail TEXT
)
"#;

// Codes are cleared on cancel, so the partial index lets a retired value be
// reissued later while active codes stay unique.
const SQL_INDEX_JOIN_CODE: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_participations_join_code
ON event_participations (join_code)
WHERE join_code IS NOT NULL
"#;

// Structural guarantee for the single-active-record invariant: cancelled rows
// fall outside the index, so re-join reactivates the existing row instead of
// inserting a competitor.
const SQL_INDEX_SINGLE_ACTIVE: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_participations_single_active
ON event_participations (user_id, event_id)
WHERE checkin_date IS NULL AND status <> 'cancelled'
"#;

const SQL_INDEX_DAILY_UNIQUE: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_participations_user_event_day
ON event_participations (user_id, event_id, checkin_date)
WHERE checkin_date IS NOT NULL
"#;

// Historical databases may hold several rows for the same (user, event, day)
// from before the uniqueness constraint existed. Keep the most recently
// created row (highest id) per triple.
const SQL_COLLAPSE_DAILY_DUPLICATES: &str = r#"
DELETE FROM event_participations
WHERE checkin_date IS NOT NULL
  AND id NOT IN (
    SELECT MAX(id)
    FROM event_participations
    WHERE checkin_date IS NOT NULL
    GROUP BY user_id, event_id, checkin_date
  )
"#;

pub async fn init_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for sql in [
        SQL_CREATE_USERS,
        SQL_CREATE_EVENTS,
        SQL_CREATE_PARTICIPATIONS,
        SQL_CREATE_SNAPSHOTS,
        SQL_CREATE_SNAPSHOT_ENTRIES,
        SQL_INDEX_JOIN_CODE,
        SQL_INDEX_SINGLE_ACTIVE,
    ] {
        sqlx::query(sql).execute(pool).await?;
    }
    ensure_daily_unique_index(pool).await?;
    Ok(())
}

pub async fn collapse_daily_duplicates(pool: &SqlitePool) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_COLLAPSE_DAILY_DUPLICATES)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Collapses duplicate daily rows, then creates the (user, event, day)
/// uniqueness index. Idempotent; safe to run at every startup.
pub async fn ensure_daily_unique_index(pool: &SqlitePool) -> sqlx::Result<u64> {
    let removed = collapse_daily_duplicates(pool).await?;
    sqlx::query(SQL_INDEX_DAILY_UNIQUE).execute(pool).await?;
    Ok(removed)
}
