use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use yoas_dump::DumpError;
use yoas_types::api::ErrorResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Forbidden: invalid access key.")]
    Forbidden,
    #[error("User not found.")]
    UserNotFound,
    #[error("This User_ID is already in database.")]
    UserExists,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
    #[error(transparent)]
    Dump(#[from] DumpError),
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<axum_extra::extract::QueryRejection> for AppError {
    fn from(rejection: axum_extra::extract::QueryRejection) -> Self {
        Self::BadRequest(rejection.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        tracing::error!("spawn_blocking join error: {}", e);
        Self::Internal
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Forbidden => {
                tracing::debug!("Rejected request with invalid access key");
                StatusCode::FORBIDDEN
            }
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::UserExists => StatusCode::BAD_REQUEST,
            AppError::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                StatusCode::BAD_REQUEST
            }
            AppError::Dump(e) if e.is_invalid_parameter() => {
                tracing::debug!(error = %e, "Invalid dump parameters");
                StatusCode::BAD_REQUEST
            }
            AppError::Storage(e) => {
                tracing::error!(error = %e, "Storage error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Dump(e) => {
                tracing::error!(error = %e, "Dump failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
