use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde_json::json;

use thiserror::Error;

use uuid::Uuid;

/// A booking submission that is missing required details
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing details")]
    MissingDetails(Vec<&'static str>),
}

/// Failures of the booking store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Store did not respond within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures of the notification sender.
/// NOTE: Never surfaced to clients, only logged
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Failed to deliver email: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Notification did not complete within {0:?}")]
    Timeout(Duration),
}

/// Failures of a single email delivery attempt
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Email API could not be reached")]
    Unreachable(#[source] reqwest::Error),

    #[error("Email API rejected the credentials (status {0})")]
    Unauthorized(u16),

    #[error("Email API quota exceeded")]
    QuotaExceeded,

    #[error("Email API refused the message (status {0})")]
    Refused(u16),
}

/// Failures of the administration operations
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Booking {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type RestResult<T> = Result<T, RestError>;

/// Client-facing errors of the administration endpoints
#[derive(Debug, Error)]
pub enum RestError {
    #[error("Parse Error: {0}")]
    ParseError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    FetchError(String),

    #[error("{0}")]
    InternalError(String),
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ParseError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::FetchError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::FetchError(msg) => json!({ "error": msg }),
            other => json!({ "message": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
