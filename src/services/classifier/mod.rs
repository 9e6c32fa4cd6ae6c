pub mod gateway;
pub mod inference;
pub mod model_manager;

use crate::error::AppError;
use crate::models::classify_types::{ClassScores, ModelStatus};
use std::path::Path;

/// Scores a single, already validated image file.
///
/// Implementations may block for seconds; callers run them on the blocking pool.
pub trait Classifier: Send + Sync + 'static {
    fn score(&self, path: &Path) -> Result<ClassScores, AppError>;

    fn status(&self) -> ModelStatus {
        ModelStatus {
            downloaded: true,
            loading: false,
            ready: true,
            error: None,
        }
    }
}
