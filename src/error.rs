//! Application error taxonomy and its HTTP translation.
//!
//! Every core operation fails with exactly one [`AppError`] kind. Handlers
//! return it directly; [`IntoResponse`] maps each kind to a status code and a
//! JSON body of the form:
//!
//! ```json
//! { "error": { "code": "validation_error", "message": "...", "details": { ... } } }
//! ```

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::validation::FieldErrors;

/// Serialized error envelope.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error description included in every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// One or more fields violate a rule. Carries every collected field error.
    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },
    /// No identity was supplied, or the supplied credentials are invalid.
    #[error("{message}")]
    Unauthorized { message: String, details: Value },
    /// The identity lacks the capability or ownership the operation requires.
    #[error("{message}")]
    Forbidden { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    /// The request is well-formed but semantically nonsensical (e.g. self-follow).
    #[error("{message}")]
    InvalidOperation { message: String, details: Value },
    #[error("{message}")]
    Conflict { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn validation(fields: FieldErrors) -> Self {
        Self::Validation {
            message: "Validation failed".to_string(),
            fields,
        }
    }

    /// A validation failure that is not tied to a single field.
    pub fn bad_request(message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = FieldErrors::new();
        fields.add(FieldErrors::NON_FIELD, message.clone());
        Self::Validation { message, fields }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn invalid_operation(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidOperation {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Field errors of a validation failure, if this is one.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InvalidOperation { .. } => (StatusCode::BAD_REQUEST, "invalid_operation"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            AppError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Converts the error into the serializable body used in responses.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code) = self.status_and_code();
        let details = match self {
            AppError::Validation { fields, .. } => json!(fields),
            AppError::Unauthorized { details, .. }
            | AppError::Forbidden { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::InvalidOperation { details, .. }
            | AppError::Conflict { details, .. }
            | AppError::Internal { details, .. } => details.clone(),
        };

        ErrorInfo {
            code,
            message: self.to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return AppError::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": db.constraint() }),
                );
            }
            if db.is_foreign_key_violation() {
                return AppError::bad_request("Referenced record does not exist");
            }
        }

        tracing::error!(error = %e, "Database error");
        AppError::internal("Database error", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        fields.merge_validator(&errors);
        AppError::validation(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::bad_request("x"), StatusCode::BAD_REQUEST),
            (
                AppError::unauthorized("x", json!({})),
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::forbidden("x", json!({})), StatusCode::FORBIDDEN),
            (AppError::not_found("x", json!({})), StatusCode::NOT_FOUND),
            (
                AppError::invalid_operation("x", json!({})),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::conflict("x", json!({})), StatusCode::CONFLICT),
            (
                AppError::internal("x", json!({})),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_unauthorized_sets_www_authenticate() {
        let response = AppError::unauthorized("no credentials", json!({})).into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_validation_details_are_field_map() {
        let mut fields = FieldErrors::new();
        fields.add("publication_year", "in the future");
        fields.add("title", "This field is required.");

        let info = AppError::validation(fields).to_error_info();

        assert_eq!(info.code, "validation_error");
        assert_eq!(info.details["publication_year"][0], "in the future");
        assert_eq!(info.details["title"][0], "This field is required.");
    }

    #[test]
    fn test_bad_request_uses_non_field_key() {
        let error = AppError::bad_request("Page must be greater than 0");
        let fields = error.field_errors().unwrap();
        assert!(fields.contains(FieldErrors::NON_FIELD));
    }
}
