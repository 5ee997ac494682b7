use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::services::lifecycle_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Unlock,
    Expire,
}

impl Pass {
    fn name(self) -> &'static str {
        match self {
            Pass::Unlock => "unlock",
            Pass::Expire => "expire",
        }
    }
}

/// Background loop driving the daily lifecycle: the unlock pass fires at
/// 00:00:00 UTC, the expire pass at 23:59:59 UTC. Both passes are idempotent,
/// so a restart mid-day at worst re-runs a no-op.
pub fn spawn(pool: SqlitePool) {
    tokio::spawn(run(pool));
}

async fn run(pool: SqlitePool) {
    info!("lifecycle scheduler started (unlock 00:00 UTC, expire 23:59:59 UTC)");
    loop {
        let now = Utc::now();
        let (at, pass) = next_boundary(now);
        let wait = (at - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        let now = Utc::now();
        let outcome = match pass {
            Pass::Unlock => lifecycle_service::run_unlock_pass(&pool, now).await,
            Pass::Expire => lifecycle_service::run_expire_pass(&pool, now).await,
        };
        match outcome {
            Ok(rows) => info!(pass = pass.name(), rows, "scheduled pass finished"),
            Err(err) => warn!(pass = pass.name(), error = %err, "scheduled pass failed"),
        }
    }
}

/// Earliest upcoming boundary strictly after `now`.
fn next_boundary(now: DateTime<Utc>) -> (DateTime<Utc>, Pass) {
    let today = now.date_naive();
    let expire_today = today
        .and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default())
        .and_utc();
    let next_midnight = (today + Duration::days(1)).and_time(NaiveTime::MIN).and_utc();

    if now < expire_today {
        (expire_today, Pass::Expire)
    } else {
        (next_midnight, Pass::Unlock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_before_end_of_day_is_expire() {
        let now = "2026-03-10T08:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let (at, pass) = next_boundary(now);
        assert_eq!(pass, Pass::Expire);
        assert_eq!(at.to_rfc3339(), "2026-03-10T23:59:59+00:00");
    }

    #[test]
    fn boundary_after_expire_instant_is_next_unlock() {
        let now = "2026-03-10T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        let (at, pass) = next_boundary(now);
        assert_eq!(pass, Pass::Unlock);
        assert_eq!(at.to_rfc3339(), "2026-03-11T00:00:00+00:00");
    }

    #[test]
    fn boundary_just_after_midnight_is_same_day_expire() {
        let now = "2026-03-11T00:00:00.250Z".parse::<DateTime<Utc>>().unwrap();
        let (at, pass) = next_boundary(now);
        assert_eq!(pass, Pass::Expire);
        assert_eq!(at.date_naive().to_string(), "2026-03-11");
    }
}
