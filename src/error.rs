use std::{backtrace::Backtrace, sync::Arc};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

/// Errors surfaced by the user repository.
///
/// `Validation` and `NotFound` are the two caller-facing kinds. Anything else
/// is an infrastructure failure passed through as-is.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("{message}")]
    Validation {
        message: String,
        action: Option<String>,
        stack: Arc<Backtrace>,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        action: Option<String>,
        stack: Arc<Backtrace>,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl UserError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            action: None,
            stack: Arc::new(Backtrace::capture()),
        }
    }

    pub fn not_found(message: impl Into<String>, action: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            action: Some(action.into()),
            stack: Arc::new(Backtrace::capture()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::NotFound { .. } => "NotFoundError",
            Self::Database(_) | Self::Internal(_) => "InternalServerError",
        }
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            Self::Validation { action, .. } | Self::NotFound { action, .. } => action.as_deref(),
            Self::Database(_) | Self::Internal(_) => None,
        }
    }

    /// Call stack captured where the error was raised. Empty unless
    /// `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE` is set.
    pub fn stack(&self) -> Option<&Backtrace> {
        match self {
            Self::Validation { stack, .. } | Self::NotFound { stack, .. } => Some(stack),
            Self::Database(_) | Self::Internal(_) => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub name: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub status_code: u16,
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "An unexpected error occurred.".to_string()
        } else {
            warn!(kind = self.name(), error = %self, "request rejected");
            self.to_string()
        };
        let body = ErrorBody {
            name: self.name(),
            message,
            action: self.action().map(str::to_owned),
            status_code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
