pub mod catalog;
pub mod classifier;

use crate::error::{AppError, ErrorCode, ModelError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::CorpusEmpty { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Model(ModelError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Model(ModelError::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Model(_) => StatusCode::BAD_GATEWAY,
            AppError::Io(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = ?self.code(), "{}", self);
        } else {
            tracing::warn!(code = ?self.code(), "{}", self);
        }

        (
            status,
            Json(ErrorBody {
                code: self.code(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
