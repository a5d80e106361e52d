//! Error types for the trade journal service

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Journal error types
#[derive(Debug, Error)]
pub enum JournalError {
    /// Missing or malformed field, rejected before reaching the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation targeted a trade that does not exist
    #[error("Trade not found: {id}")]
    NotFound {
        /// The identifier that could not be resolved
        id: String,
    },

    /// Exchange ticker fetch failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Store connectivity or write failure
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid service configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for journal results
pub type JournalResult<T> = Result<T, JournalError>;

impl JournalError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a missing trade
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// HTTP status this error maps to
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code sent to clients
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Upstream(_) => "upstream_error",
            Self::Store(_) => "store_error",
            Self::Config(_) => "config_error",
        }
    }
}

impl From<sqlx::Error> for JournalError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<reqwest::Error> for JournalError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<JsonRejection> for JournalError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for JournalError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<config::ConfigError> for JournalError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl IntoResponse for JournalError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Store and upstream details stay in the logs
        let message = match &self {
            Self::Validation(message) => message.clone(),
            Self::NotFound { .. } => self.to_string(),
            Self::Store(_) | Self::Config(_) => {
                error!(error = %self, "Request failed with internal error");
                "Internal server error".to_string()
            }
            Self::Upstream(_) => {
                error!(error = %self, "Request failed with upstream error");
                "Upstream service unavailable".to_string()
            }
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}
