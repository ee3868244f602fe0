use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::jwt::TokenError;

/// Failure surfaced to HTTP callers. Every variant maps to exactly one status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("current password does not match")]
    IncorrectCurrentPassword,

    #[error("incorrect userid or password")]
    InvalidCredentials,

    #[error(transparent)]
    Unauthenticated(#[from] TokenError),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("failed to deliver email, please try again later")]
    EmailDeliveryFailed(#[source] anyhow::Error),

    /// Request could not be decoded (body, path or query).
    #[error("{detail}")]
    Rejected { status: StatusCode, detail: String },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::IncorrectCurrentPassword => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Rejected { status, .. } => *status,
            AppError::EmailDeliveryFailed(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(e) => error!(error = ?e, "internal error"),
            AppError::EmailDeliveryFailed(e) => error!(error = %e, "email delivery failed"),
            _ => warn!(%status, detail = %self, "request rejected"),
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
