use crate::error::{AppError, ModelError};
use crate::models::classify_types::{ClassScores, ModelStatus};
use crate::services::classifier::inference::{self, PreprocessConfig};
use crate::services::classifier::Classifier;
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const MODEL_FILE: &str = "model.onnx";
const CONFIG_FILE: &str = "config.json";
const PREPROCESSOR_FILE: &str = "preprocessor_config.json";

pub type OnnxSession = Session;

/// Everything read from the model directory that inference needs.
#[derive(Debug, Clone)]
struct ModelMeta {
    labels: Vec<String>,
    class_order: [usize; 2],
    preprocess: PreprocessConfig,
}

/// Owns the ONNX Runtime session for the fine-tuned fake/real image model.
#[derive(Clone)]
pub struct ModelManager {
    pub model_dir: PathBuf,
    model: Arc<Mutex<Option<OnnxSession>>>,
    meta: Arc<Mutex<Option<ModelMeta>>>,
    loading: Arc<AtomicBool>,
    error: Arc<Mutex<Option<String>>>,
}

impl ModelManager {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            model: Arc::new(Mutex::new(None)),
            meta: Arc::new(Mutex::new(None)),
            loading: Arc::new(AtomicBool::new(false)),
            error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join(CONFIG_FILE)
    }

    pub fn is_downloaded(&self) -> bool {
        self.model_path().exists() && self.config_path().exists()
    }

    pub fn is_ready(&self) -> bool {
        relock(&self.model).is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn get_error(&self) -> Option<String> {
        self.error.lock().ok().and_then(|e| e.clone())
    }

    pub fn get_labels(&self) -> Result<Vec<String>, AppError> {
        relock(&self.meta)
            .as_ref()
            .map(|m| m.labels.clone())
            .ok_or(AppError::Model(ModelError::Unavailable))
    }

    pub async fn load_model(&self, use_gpu: bool) -> Result<(), AppError> {
        if self.is_ready() {
            return Ok(());
        }

        if self.loading.swap(true, Ordering::SeqCst) {
            return Err(AppError::inference("Model is already loading"));
        }

        self.set_error(None);
        tracing::info!(model_dir = %self.model_dir.display(), use_gpu, "loading classifier model");

        let result = self.do_load_model(use_gpu).await;
        self.loading.store(false, Ordering::SeqCst);

        match &result {
            Ok(()) => tracing::info!("classifier model ready"),
            Err(e) => {
                tracing::error!(error = %e, "failed to load classifier model");
                self.set_error(Some(e.to_string()));
            }
        }

        result
    }

    async fn do_load_model(&self, use_gpu: bool) -> Result<(), AppError> {
        let meta = self.read_meta().await?;

        let model_path = self.model_path();
        let session = tokio::task::spawn_blocking(move || -> Result<Session, AppError> {
            let _ = ort::init().with_name("deepfake-lense").commit();

            let mut builder = Session::builder()
                .map_err(|e| AppError::inference(format!("Failed to create session builder: {}", e)))?
                .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
                .map_err(|e| AppError::inference(format!("Failed to set optimization level: {}", e)))?
                .with_intra_threads(4)
                .map_err(|e| AppError::inference(format!("Failed to set intra threads: {}", e)))?;

            if use_gpu {
                builder = builder
                    .with_execution_providers([
                        ort::execution_providers::CUDAExecutionProvider::default().build(),
                        ort::execution_providers::CoreMLExecutionProvider::default().build(),
                        ort::execution_providers::CPUExecutionProvider::default().build(),
                    ])
                    .map_err(|e| AppError::inference(format!("Failed to register GPU execution providers: {}", e)))?;
            } else {
                builder = builder
                    .with_execution_providers([
                        ort::execution_providers::CPUExecutionProvider::default().build(),
                    ])
                    .map_err(|e| AppError::inference(format!("Failed to register CPU execution provider: {}", e)))?;
            }

            builder
                .commit_from_file(model_path)
                .map_err(|e| AppError::inference(format!("Failed to load ONNX model: {}", e)))
        })
        .await
        .map_err(|e| AppError::inference(format!("Failed to spawn model loading task: {}", e)))??;

        *relock(&self.meta) = Some(meta);
        *relock(&self.model) = Some(session);
        Ok(())
    }

    async fn read_meta(&self) -> Result<ModelMeta, AppError> {
        let config_path = self.config_path();
        let config_content = tokio::fs::read_to_string(&config_path).await.map_err(|e| {
            AppError::Config(format!("Failed to read config file {}: {}", config_path.display(), e))
        })?;
        let config: serde_json::Value = serde_json::from_str(&config_content)
            .map_err(|e| AppError::Config(format!("Failed to parse config JSON: {}", e)))?;
        let labels = parse_labels(&config)?;
        let class_order = class_order(&labels);

        let preprocess = match tokio::fs::read_to_string(self.model_dir.join(PREPROCESSOR_FILE)).await {
            Ok(content) => {
                let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
                    AppError::Config(format!("Failed to parse preprocessor config: {}", e))
                })?;
                PreprocessConfig::from_json(&value)
            }
            Err(_) => {
                tracing::debug!("no preprocessor config, using ViT defaults");
                PreprocessConfig::default()
            }
        };

        tracing::debug!(?labels, ?class_order, ?preprocess, "model metadata loaded");
        Ok(ModelMeta {
            labels,
            class_order,
            preprocess,
        })
    }

    fn set_error(&self, message: Option<String>) {
        if let Ok(mut slot) = self.error.lock() {
            *slot = message;
        }
    }
}

/// A panic inside a model run must not disable the model for later requests.
fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Labels ordered by class index from `id2label`.
fn parse_labels(config: &serde_json::Value) -> Result<Vec<String>, AppError> {
    let id2label = config["id2label"]
        .as_object()
        .ok_or_else(|| AppError::Config("Config missing id2label field".to_string()))?;

    let mut labels: Vec<(usize, String)> = id2label
        .iter()
        .map(|(k, v)| {
            let idx = k.parse::<usize>().unwrap_or(0);
            let label = v.as_str().unwrap_or("unknown").to_string();
            (idx, label)
        })
        .collect();
    labels.sort_by_key(|(idx, _)| *idx);
    Ok(labels.into_iter().map(|(_, label)| label).collect())
}

/// Indices of the fake and real classes; 0 = fake, 1 = real unless the labels say otherwise.
fn class_order(labels: &[String]) -> [usize; 2] {
    let find = |name: &str| labels.iter().position(|l| l.eq_ignore_ascii_case(name));
    match (find("fake"), find("real")) {
        (Some(fake), Some(real)) if fake != real => [fake, real],
        _ => [0, 1],
    }
}

impl Classifier for ModelManager {
    fn score(&self, path: &Path) -> Result<ClassScores, AppError> {
        let meta = relock(&self.meta)
            .clone()
            .ok_or(AppError::Model(ModelError::Unavailable))?;

        // Decode outside the session lock; only the model run is serialized.
        let tensor = inference::preprocess_image(path, &meta.preprocess)?;

        let mut guard = relock(&self.model);
        let session = guard
            .as_mut()
            .ok_or(AppError::Model(ModelError::Unavailable))?;
        inference::run_inference_with_model(session, tensor, meta.class_order)
    }

    fn status(&self) -> ModelStatus {
        ModelStatus {
            downloaded: self.is_downloaded(),
            loading: self.is_loading(),
            ready: self.is_ready(),
            error: self.get_error(),
        }
    }
}
