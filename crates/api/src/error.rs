use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::error::DenyReason;
use domain::DomainError;
use serde::Serialize;
use shared::jwt::JwtError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Admission refused for a reason other than the form being closed.
    #[error("Denied ({code}): {message}")]
    Denied { code: &'static str, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable ({code}): {message}")]
    ServiceUnavailable { code: &'static str, message: String },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, retryable) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, false),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, false),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, false),
            ApiError::Denied { code, message } => (StatusCode::CONFLICT, code, message, false),
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg, false)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                    false,
                )
            }
            ApiError::ServiceUnavailable { code, message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                code,
                message,
                code == UNACKNOWLEDGED,
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            retryable,
        };

        (status, Json(body)).into_response()
    }
}

const UNACKNOWLEDGED: &str = "write_unacknowledged";

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(resource) => ApiError::NotFound(format!("{} not found", resource)),
            DomainError::NotAuthorized(msg) => ApiError::Forbidden(msg),
            DomainError::Eligibility {
                reason: reason @ DenyReason::FormClosed(_),
                message,
            } => ApiError::ServiceUnavailable {
                code: reason.code(),
                message,
            },
            DomainError::Eligibility { reason, message } => ApiError::Denied {
                code: reason.code(),
                message,
            },
            DomainError::PersistenceAcknowledgement => ApiError::ServiceUnavailable {
                code: UNACKNOWLEDGED,
                message: "The response could not be confirmed, please retry".into(),
            },
            DomainError::Validation(msg) => ApiError::Validation(msg),
            err @ DomainError::TrackingDesync { .. } => ApiError::Internal(err.to_string()),
            DomainError::Store(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".into()),
            JwtError::InvalidKey(msg) | JwtError::EncodingError(msg) => ApiError::Internal(msg),
            _ => ApiError::Unauthorized("Invalid or expired token".into()),
        }
    }
}
