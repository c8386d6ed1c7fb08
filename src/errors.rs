use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::validation::ValidationErrors;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Input failed field validation; carries every field error.
    Validation(ValidationErrors),
    /// Bad request error (invalid input shape or missing parameters).
    BadRequest(String),
    /// Referenced lead does not exist.
    NotFound(String),
    /// Write collided with a unique key (duplicate email).
    Conflict(String),
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// HTTP status this error maps to at the endpoint boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::WithContext { source, .. } => source.status_code(),
        }
    }

    /// The innermost error, with any context layers peeled off.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), AppError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.root(), AppError::Conflict(_))
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation failed: {}", errors),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Client errors carry their message; server errors are logged with full
    /// detail and answered with a generic message.
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AppError::Validation(errors) => json!({
                "success": false,
                "message": "Missing or invalid fields.",
                "errors": errors,
            }),
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                json!({ "success": false, "message": msg })
            }
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                json!({ "success": false, "message": "Database error" })
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({ "success": false, "message": "Internal server error" })
            }
            AppError::WithContext { source, context } => {
                // Log full context chain, then answer as the underlying error
                if status.is_server_error() {
                    tracing::error!("Error with context: {} -> {}", context, source);
                } else {
                    tracing::debug!("Error with context: {} -> {}", context, source);
                }
                return (*source).into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    /// Converts a `sqlx::Error` into an `AppError`, classifying unique-key
    /// violations as `Conflict`.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unique key");
                return AppError::Conflict(format!(
                    "A lead with this email already exists ({})",
                    constraint
                ));
            }
        }
        AppError::DatabaseError(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::from(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::from(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldErrorKind;

    #[test]
    fn test_status_codes() {
        let validation = AppError::Validation(ValidationErrors::single(
            "email",
            FieldErrorKind::InvalidEmail,
        ));
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_context_keeps_underlying_status() {
        let err: Result<(), AppError> = Err(AppError::NotFound("lead".into()));
        let err = err.context("Deleting lead").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("Deleting lead: "));
    }

    #[test]
    fn test_plain_sqlx_error_is_database_error() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_sqlx_context_wraps_database_error() {
        let err: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
        let err = err.context("Failed to count leads").unwrap_err();
        assert!(matches!(err.root(), AppError::DatabaseError(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Failed to count leads: Database error"));
    }

    #[test]
    fn test_sqlx_with_context_is_lazy() {
        let ok: Result<u8, sqlx::Error> = Ok(7);
        let value = ok
            .with_context(|| panic!("context built for a successful result"))
            .unwrap();
        assert_eq!(value, 7);

        let err: Result<u8, sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = err
            .with_context(|| format!("Failed to load lead {}", 42))
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to load lead 42: "));
    }

    #[test]
    fn test_wrapped_response_uses_underlying_status_and_body() {
        let err: Result<(), AppError> = Err(AppError::Conflict("taken".into()));
        let response = err.context("Failed to insert lead").unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let err: Result<(), sqlx::Error> = Err(sqlx::Error::PoolClosed);
        let response = err.context("Failed to list leads").unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_hides_database_detail() {
        let response = AppError::DatabaseError(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
