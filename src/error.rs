use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

use crate::{db::StoreError, validation::FieldError};

/// Body of success responses that carry no document.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Errors returned by request handlers and extractors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    DeliveryFailure(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DeliveryFailure(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate("email") => AppError::Conflict("Email already registered".into()),
            StoreError::Duplicate(field) => AppError::Conflict(format!("{field} already exists")),
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(status = %rejection.status(), "request body rejected");
        AppError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation { message, errors } if !errors.is_empty() => {
                json!({ "message": message, "errors": errors })
            }
            AppError::Internal(e) => {
                error!(error = ?e, "unhandled error");
                json!({ "message": "Internal server error" })
            }
            other => json!({ "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(StoreError::Duplicate("email")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::Unauthenticated("no").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("no").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("no").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::DeliveryFailure("no").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_email_reads_as_already_registered() {
        let err = AppError::from(StoreError::Duplicate("email"));
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn internal_error_does_not_leak_details() {
        let res = AppError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
