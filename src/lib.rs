pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod services;

pub use app::{router, AppState};
pub use config::Config;
pub use error::{AppError, ErrorCode, ModelError};
