use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{SnapshotEntryRow, SnapshotRow};

const SNAPSHOT_COLUMNS: &str = r#"
  id,
  snapshot_id,
  event_id,
  snapshot_time,
  entry_count,
  created_by,
  description
"#;

const SQL_INSERT_SNAPSHOT: &str = r#"
INSERT INTO participant_snapshots (
  snapshot_id,
  event_id,
  snapshot_time,
  entry_count,
  created_by,
  description
) VALUES (?, ?, ?, 0, ?, ?)
"#;

pub async fn insert_snapshot(
    pool: &SqlitePool,
    snapshot_id: &str,
    event_id: i64,
    snapshot_time: DateTime<Utc>,
    created_by: Option<i64>,
    description: Option<&str>,
) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_SNAPSHOT)
        .bind(snapshot_id)
        .bind(event_id)
        .bind(snapshot_time)
        .bind(created_by)
        .bind(description)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

const SQL_INSERT_ENTRY: &str = r#"
INSERT INTO participant_snapshot_entries (
  entry_id,
  snapshot_id,
  participation_id,
  user_id,
  user_name,
  user_email,
  status,
  joined_at,
  checked_in_at,
  completed_at,
  detail
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub struct NewSnapshotEntry<'a> {
    pub entry_id: &'a str,
    pub snapshot_id: i64,
    pub participation_id: Option<i64>,
    pub user_id: i64,
    pub user_name: &'a str,
    pub user_email: Option<&'a str>,
    pub status: &'a str,
    pub joined_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub detail: Option<&'a str>,
}

pub async fn insert_entry(pool: &SqlitePool, entry: NewSnapshotEntry<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_ENTRY)
        .bind(entry.entry_id)
        .bind(entry.snapshot_id)
        .bind(entry.participation_id)
        .bind(entry.user_id)
        .bind(entry.user_name)
        .bind(entry.user_email)
        .bind(entry.status)
        .bind(entry.joined_at)
        .bind(entry.checked_in_at)
        .bind(entry.completed_at)
        .bind(entry.detail)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_SET_ENTRY_COUNT: &str = r#"
UPDATE participant_snapshots
SET entry_count = ?
WHERE id = ?
"#;

pub async fn set_entry_count(pool: &SqlitePool, id: i64, entry_count: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_ENTRY_COUNT)
        .bind(entry_count)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn load_by_snapshot_id(
    pool: &SqlitePool,
    snapshot_id: &str,
) -> sqlx::Result<Option<SnapshotRow>> {
    let sql =
        format!("SELECT {SNAPSHOT_COLUMNS} FROM participant_snapshots WHERE snapshot_id = ? LIMIT 1");
    sqlx::query_as::<_, SnapshotRow>(&sql)
        .bind(snapshot_id)
        .fetch_optional(pool)
        .await
}

pub async fn count_by_event(pool: &SqlitePool, event_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM participant_snapshots WHERE event_id = ?")
        .bind(event_id)
        .fetch_one(pool)
        .await
}

pub async fn list_by_event(
    pool: &SqlitePool,
    event_id: i64,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<SnapshotRow>> {
    let sql = format!(
        r#"
SELECT {SNAPSHOT_COLUMNS}
FROM participant_snapshots
WHERE event_id = ?
ORDER BY snapshot_time DESC, id DESC
LIMIT ? OFFSET ?
"#
    );
    sqlx::query_as::<_, SnapshotRow>(&sql)
        .bind(event_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_entries(pool: &SqlitePool, snapshot_row_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM participant_snapshot_entries WHERE snapshot_id = ?",
    )
    .bind(snapshot_row_id)
    .fetch_one(pool)
    .await
}

const SQL_LIST_ENTRIES: &str = r#"
SELECT
  id,
  entry_id,
  snapshot_id,
  participation_id,
  user_id,
  user_name,
  user_email,
  status,
  joined_at,
  checked_in_at,
  completed_at,
  detail
FROM participant_snapshot_entries
WHERE snapshot_id = ?
ORDER BY id
LIMIT ? OFFSET ?
"#;

pub async fn list_entries(
    pool: &SqlitePool,
    snapshot_row_id: i64,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<SnapshotEntryRow>> {
    sqlx::query_as::<_, SnapshotEntryRow>(SQL_LIST_ENTRIES)
        .bind(snapshot_row_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

const SQL_DELETE_SNAPSHOT: &str = r#"
DELETE FROM participant_snapshots
WHERE snapshot_id = ?
"#;

/// Entries follow the parent via ON DELETE CASCADE.
pub async fn delete_snapshot(pool: &SqlitePool, snapshot_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_SNAPSHOT)
        .bind(snapshot_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
