use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Stable condition codes handed to the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    CorpusEmpty,
    InvalidArgument,
    NotFound,
    ModelError,
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Model not loaded")]
    Unavailable,
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),
    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),
    #[error("Classification worker crashed: {0}")]
    Crashed(String),
}

/// Errors are `Clone` so one in-flight classification can resolve every waiter.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("No images found in {}/Fake or {}/Real", .base_dir.display(), .base_dir.display())]
    CorpusEmpty { base_dir: PathBuf },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Image not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::CorpusEmpty { .. } => ErrorCode::CorpusEmpty,
            AppError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Model(_) => ErrorCode::ModelError,
            AppError::Io(_) | AppError::Config(_) => ErrorCode::Internal,
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        AppError::Model(ModelError::Inference(msg.into()))
    }

    pub fn malformed_output(msg: impl Into<String>) -> Self {
        AppError::Model(ModelError::MalformedOutput(msg.into()))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
