use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::violation::RuleViolation};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A scoring rule or registry constraint refused the request.
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    /// Storage backend failed or is unreachable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Rejected(violation) => ServiceError::Rule(violation),
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request refused by a scoring or registry rule.
    #[error(transparent)]
    Rule(RuleViolation),
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Store unreachable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Rule(violation) => AppError::Rule(violation),
            ServiceError::Unavailable(source) => {
                error!(error = %source, "storage failure");
                match source {
                    StorageError::Unavailable { .. } => {
                        AppError::ServiceUnavailable(source.to_string())
                    }
                    other => AppError::Internal(other.to_string()),
                }
            }
        }
    }
}

impl AppError {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Rule(violation) => match violation {
                RuleViolation::GameNotFound(_) | RuleViolation::PlayerNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                RuleViolation::DuplicatePlayerName(_) => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind; only rule violations carry one.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            AppError::Rule(violation) => Some(violation.kind()),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        });

        (self.status(), payload).into_response()
    }
}
