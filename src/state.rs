use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::env;

/// Behavior knobs that are deliberately configuration rather than code.
#[derive(Debug, Clone, Copy)]
pub struct LifecyclePolicy {
    /// Whether re-joining after a cancellation resets the running check-in
    /// counter. Default: the counter keeps accumulating toward
    /// `max_checkins_per_user`, so a cancel/re-join cycle cannot bypass the cap.
    pub rejoin_resets_checkin_count: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        LifecyclePolicy {
            rejoin_resets_checkin_count: false,
        }
    }
}

impl LifecyclePolicy {
    pub fn from_env() -> Self {
        let rejoin_resets_checkin_count = env::var("REJOIN_RESETS_CHECKIN_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);
        LifecyclePolicy {
            rejoin_resets_checkin_count,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub policy: LifecyclePolicy,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.pool.clone()
    }
}
