use crate::app::AppState;
use crate::error::AppError;
use crate::models::classify_types::{ClassificationResult, ModelStatus};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub image: String,
}

pub async fn check(
    State(state): State<AppState>,
    request: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<ClassificationResult>, AppError> {
    let Json(request) = request.map_err(|e| AppError::invalid_argument(e.body_text()))?;
    let result = state.gateway.classify(&request.image).await?;
    Ok(Json(result))
}

pub async fn model_status(State(state): State<AppState>) -> Json<ModelStatus> {
    Json(state.gateway.classifier().status())
}
