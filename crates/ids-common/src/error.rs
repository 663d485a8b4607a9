//! Centralized error taxonomy (§7) for the Identity Service core.
//!
//! Every fallible operation in `ids-core`, `ids-db`, `ids-api`, `ids-gateway`, and
//! `ids-voice` returns `IdsError`. REST handlers convert it via `IntoResponse`;
//! socket handlers convert it via [`IdsError::frame_code`] into an `error` frame.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum IdsError {
    #[error("missing or invalid credential")]
    Unauthorized,

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("{resource} conflict")]
    Conflict { resource: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IdsError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden { reason: reason.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable `code` string used both in the REST JSON body and socket `error` frames.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::BadRequest { .. } => "bad_request",
            Self::RateLimited { .. } => "rate_limited",
            Self::Database(_) | Self::Internal(_) => "internal",
        }
    }

    /// The denying rule id or permission key, when this is a `Forbidden`.
    /// Principals below moderator (security level < 50) never see this — callers
    /// at the REST/socket boundary must check the caller's level before including it.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Forbidden { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

/// JSON error response body, matching §6's `{error, code, reason?}` shape.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl IdsError {
    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "database error");
                "an internal error occurred".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "an internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let retry_after = match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        };

        ErrorBody {
            error: message,
            code: self.code().to_string(),
            reason: self.reason().map(str::to_string),
            retry_after,
        }
    }
}

impl IntoResponse for IdsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_body();
        (status, axum::Json(body)).into_response()
    }
}

pub type IdsResult<T> = Result<T, IdsError>;
