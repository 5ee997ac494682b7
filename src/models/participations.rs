use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Lifecycle states of a participation record. `Expired` is terminal and
/// distinct from `Cancelled`: it marks a day code that lapsed unused, while
/// cancelled rows can be reactivated in place on re-join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipationStatus {
    Joined,
    CheckedIn,
    Completed,
    Cancelled,
    Expired,
}

impl ParticipationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipationStatus::Joined => "joined",
            ParticipationStatus::CheckedIn => "checked_in",
            ParticipationStatus::Completed => "completed",
            ParticipationStatus::Cancelled => "cancelled",
            ParticipationStatus::Expired => "expired",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "joined" => Some(ParticipationStatus::Joined),
            "checked_in" => Some(ParticipationStatus::CheckedIn),
            "completed" => Some(ParticipationStatus::Completed),
            "cancelled" => Some(ParticipationStatus::Cancelled),
            "expired" => Some(ParticipationStatus::Expired),
            _ => None,
        }
    }

    /// States from which a user-initiated cancel is valid.
    pub fn can_cancel(self) -> bool {
        matches!(
            self,
            ParticipationStatus::Joined | ParticipationStatus::CheckedIn
        )
    }
}

/// One user's relationship to one event. Multi-day events carry one row per
/// day (`checkin_date` set); single-day registrations leave it NULL.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ParticipationRow {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub join_code: Option<String>,
    pub status: String,
    pub checkin_date: Option<NaiveDate>,
    pub code_used: i64,
    pub code_expires_at: Option<DateTime<Utc>>,
    pub pre_registered: i64,
    pub checkin_count: i64,
    pub checked_in_by: Option<i64>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub completed_by: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParticipationRow {
    pub fn parsed_status(&self) -> Option<ParticipationStatus> {
        ParticipationStatus::parse(&self.status)
    }

    pub fn is_code_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.code_expires_at, Some(expires) if now > expires)
    }
}

/// Participation joined with the holder's identity. Backs the staff roster
/// view and snapshot capture.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RosterRow {
    pub participation_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: Option<String>,
    pub status: String,
    pub join_code: Option<String>,
    pub checkin_date: Option<NaiveDate>,
    pub code_used: i64,
    pub pre_registered: i64,
    pub checkin_count: i64,
    pub cancellation_reason: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}
