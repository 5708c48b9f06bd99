//! Application error type shared by every layer.
//!
//! Each variant maps onto a single HTTP status code. Validation failures carry
//! a specific message for the caller; store failures are reported without
//! leaking driver details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::utils::db_error::is_unique_violation_on_code;

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: ErrorInfo,
}

/// Machine-readable error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid alias: {0}")]
    InvalidAlias(String),

    #[error("Alias '{0}' is reserved")]
    ReservedAlias(String),

    #[error("Alias '{0}' is already taken")]
    AliasTaken(String),

    #[error("URL was rejected by the content filter")]
    MaliciousUrl,

    #[error("Invalid short code: {0}")]
    InvalidShortCode(String),

    #[error("Short link not found")]
    NotFound { code: String },

    #[error("Request validation failed: {message}")]
    Validation { message: String, details: Value },

    /// Unique violation on `short_code`. Never reaches a client: the engine
    /// either retries with a new candidate or reports [`AppError::AliasTaken`].
    #[error("Short code '{0}' already exists")]
    CodeConflict(String),

    #[error("Unable to allocate a unique short code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(code: impl Into<String>) -> Self {
        Self::NotFound { code: code.into() }
    }

    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl(_)
            | Self::InvalidAlias(_)
            | Self::ReservedAlias(_)
            | Self::InvalidShortCode(_)
            | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::MaliciousUrl => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AliasTaken(_) | Self::CodeConflict(_) => StatusCode::CONFLICT,
            Self::CodeSpaceExhausted { .. } | Self::StoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts the error into the JSON payload returned to clients.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, details) = match self {
            Self::InvalidUrl(reason) => ("invalid_url", json!({ "reason": reason })),
            Self::InvalidAlias(reason) => ("invalid_alias", json!({ "reason": reason })),
            Self::ReservedAlias(alias) => ("reserved_alias", json!({ "alias": alias })),
            Self::AliasTaken(alias) => ("alias_taken", json!({ "alias": alias })),
            Self::MaliciousUrl => ("malicious_url", json!({})),
            Self::InvalidShortCode(code) => ("invalid_short_code", json!({ "code": code })),
            Self::NotFound { code } => ("not_found", json!({ "code": code })),
            Self::Validation { details, .. } => ("validation_error", details.clone()),
            Self::CodeConflict(code) => ("conflict", json!({ "code": code })),
            Self::CodeSpaceExhausted { attempts } => {
                ("code_space_exhausted", json!({ "attempts": attempts }))
            }
            Self::StoreUnavailable(_) => ("store_unavailable", json!({})),
            Self::Internal(_) => ("internal_error", json!({})),
        };

        let message = match self {
            // Driver messages stay in the logs.
            Self::StoreUnavailable(_) => "Record store unavailable".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorBody {
            success: false,
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = e.field_errors().keys().map(|k| k.to_string()).collect();
        AppError::bad_request(e.to_string(), json!({ "fields": fields }))
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if is_unique_violation_on_code(&e) {
        let code = e
            .as_database_error()
            .and_then(|db| db.constraint())
            .unwrap_or_default()
            .to_string();
        return AppError::CodeConflict(code);
    }

    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::StoreUnavailable(e.to_string())
        }
        other => AppError::Internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::InvalidUrl("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ReservedAlias("stats".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::MaliciousUrl.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::AliasTaken("mylink".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::not_found("abc").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::StoreUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_store_details_are_not_exposed() {
        let info = AppError::StoreUnavailable("connection refused on 10.0.0.5".into())
            .to_error_info();

        assert_eq!(info.code, "store_unavailable");
        assert!(!info.message.contains("10.0.0.5"));
    }

    #[test]
    fn test_alias_taken_details() {
        let info = AppError::AliasTaken("mylink".into()).to_error_info();

        assert_eq!(info.code, "alias_taken");
        assert_eq!(info.details["alias"], "mylink");
        assert!(info.message.contains("mylink"));
    }
}
