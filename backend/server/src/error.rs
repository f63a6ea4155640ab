use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{auth::AuthError, judge::JudgeError, store::StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Missing or invalid credentials")]
    Unauthorized,

    #[error("No riddle found")]
    RiddleNotFound,

    #[error("Answer already submitted")]
    AlreadySubmitted,

    #[error("No hints left")]
    NoHintsLeft,

    #[error("Message limit reached")]
    MessageLimit,

    #[error("Judge unavailable: {0}")]
    JudgeUnavailable(#[from] JudgeError),

    #[error("Auth provider unavailable: {0}")]
    AuthUnavailable(AuthError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken => AppError::Unauthorized,
            other => AppError::AuthUnavailable(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RiddleNotFound => StatusCode::NOT_FOUND,
            AppError::AlreadySubmitted | AppError::NoHintsLeft => StatusCode::CONFLICT,
            AppError::MessageLimit => StatusCode::TOO_MANY_REQUESTS,
            AppError::JudgeUnavailable { .. } | AppError::AuthUnavailable { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("{self}");
        }

        (status, self.to_string()).into_response()
    }
}
