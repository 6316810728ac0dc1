//! Request rejection errors shared by the WebSocket gateway and HTTP handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    domain::ValueObjectError, infrastructure::auth::AuthError,
    infrastructure::dto::http::ErrorResponseDto, usecase::GetMessageHistoryError,
};

/// An error surfaced to the caller as a JSON body `{"error": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid room ID format")]
    InvalidRoomId(#[source] ValueObjectError),

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Failed to load messages")]
    History(#[from] GetMessageHistoryError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRoomId(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::History(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponseDto {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
