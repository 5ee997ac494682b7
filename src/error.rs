use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Failures surfaced at the request boundary. Every variant maps to a
/// machine-readable kind and a human-readable hint; none of them crash the
/// process.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("you already have an active registration for this event")]
    AlreadyJoined,

    #[error("this action is not allowed from status '{0}'")]
    InvalidTransition(String),

    #[error("this event does not support pre-registration")]
    NotMultiDayEvent,

    #[error("you are already pre-registered for this event")]
    AlreadyPreRegistered,

    #[error("this code is not known; ask the participant to re-check it or enter manually")]
    CodeNotFound,

    #[error("this code has expired; a new code is issued at the start of each day")]
    CodeExpired,

    #[error("this code has already been used today")]
    CodeAlreadyUsed,

    #[error("the record was changed by another request; retry")]
    ConflictingUpdate,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("this event is full")]
    EventFull,

    #[error("this event is not open for registration")]
    EventNotOpen,

    #[error("you have reached the check-in limit for this event")]
    CheckinLimitReached,

    #[error("staff role required")]
    Forbidden,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::AlreadyJoined => "already_joined",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::NotMultiDayEvent => "not_multi_day_event",
            AppError::AlreadyPreRegistered => "already_pre_registered",
            AppError::CodeNotFound => "code_not_found",
            AppError::CodeExpired => "code_expired",
            AppError::CodeAlreadyUsed => "code_already_used",
            AppError::ConflictingUpdate => "conflicting_update",
            AppError::NotFound(_) => "not_found",
            AppError::EventFull => "event_full",
            AppError::EventNotOpen => "event_not_open",
            AppError::CheckinLimitReached => "checkin_limit_reached",
            AppError::Forbidden => "forbidden",
            AppError::Database(_) => "internal",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AlreadyJoined
            | AppError::AlreadyPreRegistered
            | AppError::InvalidTransition(_)
            | AppError::CodeAlreadyUsed
            | AppError::ConflictingUpdate => StatusCode::CONFLICT,
            AppError::NotMultiDayEvent
            | AppError::CodeExpired
            | AppError::EventFull
            | AppError::EventNotOpen
            | AppError::CheckinLimitReached => StatusCode::BAD_REQUEST,
            AppError::CodeNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Database(ref e) = self {
            tracing::warn!("request failed on database error: {}", e);
        }
        let body = serde_json::json!({
            "error": self.kind(),
            "hint": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
