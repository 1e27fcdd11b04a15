//! Error types shared by the stores, the services and the HTTP layer
//!
//! Every failure is a `RecordError`. The HTTP boundary turns it into a
//! status code plus a `{"message": ...}` body through `ResponseError`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::{error, warn};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Unknown user id
    #[error("User not found")]
    NotFound,

    /// Secret did not match the stored hash
    #[error("Invalid credentials")]
    Authentication,

    /// Object store rejected or failed the write
    #[error("File upload failed: {0}")]
    Upload(String),

    /// Record store failure
    #[error("Database error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RecordError>;

/// JSON body sent back for every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl RecordError {
    pub fn validation(message: impl Into<String>) -> Self {
        RecordError::Validation(message.into())
    }
}

impl From<rusqlite::Error> for RecordError {
    fn from(e: rusqlite::Error) -> Self {
        RecordError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::Persistence(format!("corrupt record document: {}", e))
    }
}

impl From<actix_web::error::BlockingError> for RecordError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        RecordError::Internal(e.to_string())
    }
}

impl ResponseError for RecordError {
    fn status_code(&self) -> StatusCode {
        match self {
            RecordError::Validation(_) => StatusCode::BAD_REQUEST,
            RecordError::NotFound => StatusCode::NOT_FOUND,
            RecordError::Authentication => StatusCode::UNAUTHORIZED,
            RecordError::Upload(_) | RecordError::Persistence(_) | RecordError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        } else {
            warn!("Request rejected with {}: {}", status, self);
        }
        HttpResponse::build(status).json(ErrorBody {
            message: self.to_string(),
        })
    }
}
