//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes:
//! `{"error": <code>, "message": <text>, "field"?: <name>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::db::DbError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// A foreign key points at nothing (400)
    UnknownReference { field: &'static str },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: i32 },

    /// Row is still referenced (409)
    Conflict { resource: &'static str, id: i32 },

    /// Database error (500, logged)
    Database(DbError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnknownReference { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::Validation(e) => error_body("validation_error", e.to_string(), e.field()),
            Self::UnknownReference { field } => error_body(
                "validation_error",
                format!("{} does not reference an existing row", field),
                Some(*field),
            ),
            Self::NotFound { resource, id } => {
                error_body("not_found", format!("{} {} not found", resource, id), None)
            }
            Self::Conflict { resource, id } => error_body(
                "conflict",
                format!("{} {} is still referenced by other rows", resource, id),
                None,
            ),
            Self::Database(_) => {
                error_body("internal_error", "an internal error occurred".into(), None)
            }
        }
    }
}

fn error_body(code: &str, message: String, field: Option<&str>) -> Value {
    let mut body = json!({
        "error": code,
        "message": message,
    });
    if let Some(field) = field {
        body["field"] = field.into();
    }
    body
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Database(e) = &self {
            // Log the actual error, return generic message
            tracing::error!(error = %e, "database error");
        }

        (self.status(), Json(self.body())).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::MissingReference { field } => Self::UnknownReference { field },
            DbError::StillReferenced { resource, id } => Self::Conflict { resource, id },
            _ => Self::Database(e),
        }
    }
}
