//! Service and HTTP error types.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{dao::storage::StorageError, services::auto_dequeue::skills_scraper::ScrapeError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A data file could not be read or written.
    #[error("storage failure")]
    Storage(#[source] StorageError),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Registration is closed.
    #[error("skills queue is closed ({reason})")]
    QueueClosed {
        /// Capacity reason reported for the refusal.
        reason: String,
    },
    /// Team is already serving or waiting.
    #[error("team {0} is already in the queue")]
    AlreadyQueued(String),
    /// The tournament manager could not be reached or read.
    #[error("tournament manager unavailable")]
    Upstream(#[source] ScrapeError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Storage(err)
    }
}

impl From<ScrapeError> for ServiceError {
    fn from(err: ScrapeError) -> Self {
        ServiceError::Upstream(err)
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Registration refused.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Upstream dependency failed.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Storage(source) => AppError::Internal(source.to_string()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            err @ ServiceError::QueueClosed { .. } => AppError::Forbidden(err.to_string()),
            err @ ServiceError::AlreadyQueued(_) => AppError::BadRequest(err.to_string()),
            ServiceError::Upstream(source) => AppError::BadGateway(source.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_http_statuses() {
        let cases = [
            (
                ServiceError::QueueClosed {
                    reason: "past_cutoff".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                ServiceError::AlreadyQueued("1A".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::InvalidState("queue is empty".into()),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::NotFound("team 1A".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::Upstream(ScrapeError::Parse("bad".into())),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
