use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::model::leave_request::LeaveStatus;

pub type AppResult<T> = Result<T, AppError>;

/// Business-rule and infrastructure failures surfaced by the services.
///
/// Everything except `Database` is an expected outcome under normal use and
/// is mapped to a structured 4xx body; `Database` is logged and hidden.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    DuplicateRecord(String),

    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,

    #[display(fmt = "Already checked out today")]
    AlreadyCheckedOut,

    #[display(fmt = "No check-in found for today")]
    NoCheckIn,

    #[display(fmt = "end_date cannot be before start_date")]
    InvalidRange,

    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(
        fmt = "Insufficient leave balance: requested {} day(s), available {}",
        requested,
        available
    )]
    InsufficientBalance { requested: f64, available: f64 },

    #[display(
        fmt = "Requested {} day(s) exceeds the maximum of {} per request",
        requested,
        max
    )]
    PolicyLimitExceeded { requested: i32, max: i32 },

    #[display(
        fmt = "Requested {} day(s) is below the minimum of {} per request",
        requested,
        min
    )]
    PolicyMinimumNotMet { requested: i32, min: i32 },

    #[display(fmt = "Leave request is {} and can no longer change", current)]
    InvalidState { current: LeaveStatus },

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "{} was modified concurrently, try again", _0)]
    ConcurrentModification(String),

    #[display(fmt = "Database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn not_found(entity: &str, id: u64) -> Self {
        AppError::NotFound(format!("{} {} not found", entity, id))
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DuplicateRecord(_) => "DUPLICATE_RECORD",
            AppError::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            AppError::AlreadyCheckedOut => "ALREADY_CHECKED_OUT",
            AppError::NoCheckIn => "NO_CHECK_IN",
            AppError::InvalidRange => "INVALID_RANGE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            AppError::PolicyLimitExceeded { .. } => "POLICY_LIMIT_EXCEEDED",
            AppError::PolicyMinimumNotMet { .. } => "POLICY_MINIMUM_NOT_MET",
            AppError::InvalidState { .. } => "INVALID_STATE",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            AppError::Database(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ConcurrentModification(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "message": message,
        }))
    }
}
