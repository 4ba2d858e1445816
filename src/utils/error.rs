use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, info};

use crate::db::DatastoreError;
use crate::services::{CheckInError, PricingError, RegistrationError, TierError};
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error")]
    DatabaseError(#[from] DatastoreError),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalServiceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                info!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::ExternalServiceError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::Datastore(e) => AppError::DatabaseError(e),
            other => AppError::ValidationError(other.to_string()),
        }
    }
}

impl From<TierError> for AppError {
    fn from(err: TierError) -> Self {
        match err {
            TierError::InvalidRange(msg) => AppError::ValidationError(msg),
            TierError::AlreadySeeded(_) => AppError::ValidationError(err.to_string()),
            TierError::Overlap { .. } => AppError::Conflict(err.to_string()),
            TierError::NotFound(_) => AppError::NotFound(err.to_string()),
            TierError::Datastore(e) => AppError::DatabaseError(e),
        }
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Validation(msg) => AppError::ValidationError(msg),
            RegistrationError::Pricing(e) => e.into(),
            RegistrationError::PricingChanged { .. } => AppError::ValidationError(err.to_string()),
            RegistrationError::NoEvent => AppError::NotFound(err.to_string()),
            RegistrationError::Prepare { ref source, .. } => {
                error!(error = %source, "Ticket preparation failed");
                AppError::ExternalServiceError(err.to_string())
            }
            RegistrationError::Commit { ref source } => {
                error!(error = %source, "Ticket commit failed");
                AppError::ExternalServiceError(err.to_string())
            }
            RegistrationError::Datastore(e) => AppError::DatabaseError(e),
        }
    }
}

impl From<CheckInError> for AppError {
    fn from(err: CheckInError) -> Self {
        match err {
            CheckInError::NotFound(_) => AppError::NotFound(err.to_string()),
            CheckInError::Datastore(e) => AppError::DatabaseError(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Only expose high-level message to the client
        let public_message = match &self {
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ExternalServiceError(msg) => msg.clone(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
        };

        error_response(code, public_message, None, status)
    }
}
