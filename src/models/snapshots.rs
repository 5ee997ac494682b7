use chrono::{DateTime, Utc};
use serde::Serialize;

/// A point-in-time roster copy. Immutable once written; removed only by an
/// explicit delete that cascades to its entries.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: i64,
    pub snapshot_id: String,
    pub event_id: i64,
    pub snapshot_time: DateTime<Utc>,
    pub entry_count: i64,
    pub created_by: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SnapshotEntryRow {
    pub id: i64,
    pub entry_id: String,
    pub snapshot_id: i64,
    pub participation_id: Option<i64>,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: Option<String>,
    pub status: String,
    pub joined_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Denormalized extras (join code, check-in date) as a JSON object.
    pub detail: Option<String>,
}
