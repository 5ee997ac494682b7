use chrono::NaiveDate;
use serde::Serialize;

pub const EVENT_TYPE_SINGLE_DAY: &str = "single_day";
pub const EVENT_TYPE_MULTI_DAY: &str = "multi_day";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub title: String,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub event_end_date: Option<NaiveDate>,
    pub max_participants: Option<i64>,
    pub max_checkins_per_user: Option<i64>,
    pub is_active: i64,
    pub is_published: i64,
    pub created_by: Option<i64>,
}

impl EventRow {
    pub fn is_multi_day(&self) -> bool {
        self.event_type == EVENT_TYPE_MULTI_DAY
    }

    pub fn is_open(&self) -> bool {
        self.is_active == 1 && self.is_published == 1
    }

    pub fn start_date(&self) -> NaiveDate {
        self.event_date
    }

    /// Single-day events have no explicit end date.
    pub fn end_date(&self) -> NaiveDate {
        self.event_end_date.unwrap_or(self.event_date)
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.start_date() <= day && day <= self.end_date()
    }
}
