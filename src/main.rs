use anyhow::Context;
use deepfake_lense_lib::services::classifier::model_manager::ModelManager;
use deepfake_lense_lib::services::watcher::CorpusWatcher;
use deepfake_lense_lib::{logger, router, AppError, AppState, Config};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init();

    let config = Config::load().context("failed to load configuration")?;
    tracing::info!(?config, "starting deepfake-lense");

    let model_manager = ModelManager::new(config.model_dir.clone());
    let state = AppState::new(&config, Arc::new(model_manager.clone()));

    if config.eager_catalog {
        match state.catalog.get_catalog().await {
            Ok(catalog) if catalog.is_empty() => {
                let err = AppError::CorpusEmpty {
                    base_dir: config.corpus_dir.clone(),
                };
                tracing::warn!(code = ?err.code(), "{}", err);
            }
            Ok(catalog) => tracing::info!(count = catalog.len(), "catalog ready"),
            Err(e) => tracing::error!(error = %e, "initial catalog build failed"),
        }
    }

    let _watcher = if config.watch_corpus {
        match CorpusWatcher::start(state.catalog.clone()) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::error!(error = %e, "failed to watch corpus directory");
                None
            }
        }
    } else {
        None
    };

    let use_gpu = config.use_gpu;
    tokio::spawn(async move {
        if !model_manager.is_downloaded() {
            tracing::error!(
                model_dir = %model_manager.model_dir.display(),
                "model files missing; classification requests will fail"
            );
            return;
        }
        let _ = model_manager.load_model(use_gpu).await;
    });

    let app = router(state, &config);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        corpus = %config.corpus_dir.display(),
        static_dir = %config.static_dir.display(),
        "serving corpus at /data_static/ and web assets at /web_static/"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
