use crate::commands;
use crate::config::Config;
use crate::services::catalog_cache::CatalogCache;
use crate::services::classifier::gateway::{GatewayOptions, InferenceGateway};
use crate::services::classifier::Classifier;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared services handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogCache,
    pub gateway: InferenceGateway,
    pub page_size: usize,
}

impl AppState {
    pub fn new(config: &Config, classifier: Arc<dyn Classifier>) -> Self {
        let gateway = InferenceGateway::new(
            classifier,
            GatewayOptions {
                max_concurrent: config.max_concurrent_inferences,
                timeout: config.inference_timeout(),
                corpus_root: Some(config.corpus_dir.clone()),
            },
        );
        Self {
            catalog: CatalogCache::new(config.corpus_dir.clone()),
            gateway,
            page_size: config.page_size,
        }
    }
}

pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/", get(commands::catalog::index))
        .route("/page/{page}", get(commands::catalog::page))
        .route("/catalog/refresh", post(commands::catalog::refresh))
        .route("/check", post(commands::classifier::check))
        .route("/model/status", get(commands::classifier::model_status))
        .nest_service("/data_static", ServeDir::new(&config.corpus_dir))
        .nest_service("/web_static", ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
