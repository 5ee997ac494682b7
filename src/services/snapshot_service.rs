use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::{event_repo, participation_repo, snapshot_repo};
use crate::database::snapshot_repo::NewSnapshotEntry;
use crate::error::{AppError, AppResult};
use crate::models::{SnapshotEntryRow, SnapshotRow};

const MAX_PAGE_SIZE: i64 = 200;
const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Debug, Serialize)]
pub struct SnapshotPage {
    pub snapshots: Vec<SnapshotRow>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Serialize)]
pub struct SnapshotEntryPage {
    pub snapshot: SnapshotRow,
    pub entries: Vec<SnapshotEntryRow>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

fn clamp_page(page: Option<i64>, page_size: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

/// Captures the full roster of an event as a denormalized copy. Entries keep
/// the user's name and email as they were at capture time, so later profile
/// edits or row deletions do not rewrite history.
pub async fn create_snapshot(
    pool: &SqlitePool,
    event_id: i64,
    created_by: i64,
    description: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<SnapshotRow> {
    event_repo::load_event(pool, event_id)
        .await?
        .ok_or(AppError::NotFound("event"))?;

    let roster = participation_repo::list_event_roster(pool, event_id).await?;

    let snapshot_id = Uuid::new_v4().to_string();
    let row_id = snapshot_repo::insert_snapshot(
        pool,
        &snapshot_id,
        event_id,
        now,
        Some(created_by),
        description,
    )
    .await?;

    let mut entry_count = 0i64;
    for member in &roster {
        let detail = json!({
            "join_code": member.join_code,
            "checkin_date": member.checkin_date,
            "code_used": member.code_used != 0,
            "pre_registered": member.pre_registered != 0,
            "checkin_count": member.checkin_count,
            "cancellation_reason": member.cancellation_reason,
            "cancelled_at": member.cancelled_at,
        })
        .to_string();
        let entry_id = Uuid::new_v4().to_string();
        snapshot_repo::insert_entry(
            pool,
            NewSnapshotEntry {
                entry_id: &entry_id,
                snapshot_id: row_id,
                participation_id: Some(member.participation_id),
                user_id: member.user_id,
                user_name: &member.user_name,
                user_email: member.user_email.as_deref(),
                status: &member.status,
                joined_at: Some(member.joined_at),
                checked_in_at: member.checked_in_at,
                completed_at: member.completed_at,
                detail: Some(&detail),
            },
        )
        .await?;
        entry_count += 1;
    }
    snapshot_repo::set_entry_count(pool, row_id, entry_count).await?;

    info!(event_id, %snapshot_id, entry_count, "roster snapshot captured");
    snapshot_repo::load_by_snapshot_id(pool, &snapshot_id)
        .await?
        .ok_or(AppError::NotFound("snapshot"))
}

pub async fn list_snapshots(
    pool: &SqlitePool,
    event_id: i64,
    page: Option<i64>,
    page_size: Option<i64>,
) -> AppResult<SnapshotPage> {
    event_repo::load_event(pool, event_id)
        .await?
        .ok_or(AppError::NotFound("event"))?;

    let (page, page_size) = clamp_page(page, page_size);
    let total = snapshot_repo::count_by_event(pool, event_id).await?;
    let snapshots =
        snapshot_repo::list_by_event(pool, event_id, page_size, (page - 1) * page_size).await?;
    Ok(SnapshotPage {
        snapshots,
        total,
        page,
        page_size,
    })
}

pub async fn snapshot_entries(
    pool: &SqlitePool,
    snapshot_id: &str,
    page: Option<i64>,
    page_size: Option<i64>,
) -> AppResult<SnapshotEntryPage> {
    let snapshot = snapshot_repo::load_by_snapshot_id(pool, snapshot_id)
        .await?
        .ok_or(AppError::NotFound("snapshot"))?;

    let (page, page_size) = clamp_page(page, page_size);
    let total = snapshot_repo::count_entries(pool, snapshot.id).await?;
    let entries =
        snapshot_repo::list_entries(pool, snapshot.id, page_size, (page - 1) * page_size).await?;
    Ok(SnapshotEntryPage {
        snapshot,
        entries,
        total,
        page,
        page_size,
    })
}

pub async fn delete_snapshot(pool: &SqlitePool, snapshot_id: &str) -> AppResult<()> {
    let deleted = snapshot_repo::delete_snapshot(pool, snapshot_id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("snapshot"));
    }
    info!(%snapshot_id, "roster snapshot deleted");
    Ok(())
}
