use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use thiserror::Error;

use crate::board::BoardError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Security code is required")]
    MissingCode,

    #[error("Invalid security code")]
    InvalidCode,

    #[error("Space is locked")]
    Locked,

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BoardError> for AppError {
    fn from(e: BoardError) -> Self {
        match e {
            BoardError::NotFound(_) => AppError::NotFound,
            BoardError::Invalid(message) => AppError::Invalid(message),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingCode | AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCode => StatusCode::UNAUTHORIZED,
            AppError::Locked => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(ref message) => {
                error!("{message}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
