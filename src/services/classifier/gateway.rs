use crate::error::{AppError, ModelError};
use crate::models::catalog_types::Category;
use crate::models::classify_types::{ClassScores, ClassificationResult};
use crate::services::classifier::Classifier;
use crate::services::corpus_service;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Raw probabilities may be off by this much before they count as malformed.
const SUM_TOLERANCE: f64 = 1e-3;

type Flight = Shared<BoxFuture<'static, Result<ClassificationResult, AppError>>>;
type Registry = Arc<Mutex<HashMap<PathBuf, Flight>>>;

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Upper bound on classifier runs for different images at the same time.
    pub max_concurrent: usize,
    /// Per-waiter bound; the classification itself keeps running.
    pub timeout: Option<Duration>,
    /// Only images in this directory's `Fake` and `Real` folders are accepted.
    pub corpus_root: Option<PathBuf>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            timeout: None,
            corpus_root: None,
        }
    }
}

/// Single-flight front for the classifier.
///
/// Concurrent requests for the same canonical path share one classification.
/// The registry mutex only guards membership; the work runs on a spawned task
/// that removes its own entry when it finishes, whether it succeeded or not.
#[derive(Clone)]
pub struct InferenceGateway {
    classifier: Arc<dyn Classifier>,
    in_flight: Registry,
    permits: Arc<Semaphore>,
    options: GatewayOptions,
}

impl InferenceGateway {
    pub fn new(classifier: Arc<dyn Classifier>, options: GatewayOptions) -> Self {
        Self {
            classifier,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            permits: Arc::new(Semaphore::new(options.max_concurrent.max(1))),
            options,
        }
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    pub fn in_flight_count(&self) -> usize {
        lock(&self.in_flight).len()
    }

    pub fn is_in_flight(&self, path: &Path) -> bool {
        lock(&self.in_flight).contains_key(path)
    }

    pub async fn classify(&self, image_path: &str) -> Result<ClassificationResult, AppError> {
        let path = self.resolve(image_path).await?;
        let flight = self.join_or_start(path);

        match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, flight)
                .await
                .map_err(|_| AppError::Model(ModelError::Timeout(limit)))?,
            None => flight.await,
        }
    }

    /// Canonical path of an existing, readable corpus image.
    ///
    /// Membership is decided on the requested path: an image file directly
    /// inside `<root>/Fake` or `<root>/Real` (or, without a root, inside any
    /// directory with one of those names). Symlinked images are accepted.
    async fn resolve(&self, image_path: &str) -> Result<PathBuf, AppError> {
        if image_path.trim().is_empty() || image_path.contains('\0') {
            return Err(AppError::invalid_argument(format!(
                "malformed image path {:?}",
                image_path
            )));
        }

        let not_found = || AppError::NotFound(image_path.to_string());

        let requested = Path::new(image_path);
        if !corpus_service::is_image_file(requested) {
            return Err(not_found());
        }
        let parent = match requested.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let parent = tokio::fs::canonicalize(parent)
            .await
            .map_err(|_| not_found())?;

        if !self.is_category_dir(&parent).await {
            tracing::warn!(path = %image_path, "classification requested outside corpus");
            return Err(not_found());
        }

        let path = tokio::fs::canonicalize(requested)
            .await
            .map_err(|_| not_found())?;
        let meta = tokio::fs::metadata(&path).await.map_err(|_| not_found())?;
        if !meta.is_file() {
            return Err(not_found());
        }

        tokio::fs::File::open(&path).await.map_err(|_| not_found())?;
        Ok(path)
    }

    async fn is_category_dir(&self, dir: &Path) -> bool {
        match &self.options.corpus_root {
            Some(root) => {
                for category in Category::ALL {
                    let candidate = tokio::fs::canonicalize(root.join(category.dir_name())).await;
                    if matches!(candidate, Ok(c) if c == dir) {
                        return true;
                    }
                }
                false
            }
            None => dir
                .file_name()
                .map(|name| Category::ALL.iter().any(|c| name == c.dir_name()))
                .unwrap_or(false),
        }
    }

    fn join_or_start(&self, path: PathBuf) -> Flight {
        let mut in_flight = lock(&self.in_flight);
        if let Some(existing) = in_flight.get(&path) {
            tracing::debug!(path = %path.display(), "attaching to in-flight classification");
            return existing.clone();
        }

        tracing::debug!(path = %path.display(), "starting classification");
        let handle = tokio::spawn(run_flight(
            self.classifier.clone(),
            self.permits.clone(),
            self.in_flight.clone(),
            path.clone(),
        ));

        // Dropping every waiter detaches the task rather than aborting it.
        let flight = async move {
            handle.await.unwrap_or_else(|e| {
                Err(AppError::Model(ModelError::Crashed(format!(
                    "classification task failed: {}",
                    e
                ))))
            })
        }
        .boxed()
        .shared();

        in_flight.insert(path, flight.clone());
        flight
    }
}

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<PathBuf, Flight>> {
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes the registry entry when the flight ends, on every exit path.
struct FlightGuard {
    registry: Registry,
    path: PathBuf,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        lock(&self.registry).remove(&self.path);
    }
}

async fn run_flight(
    classifier: Arc<dyn Classifier>,
    permits: Arc<Semaphore>,
    registry: Registry,
    path: PathBuf,
) -> Result<ClassificationResult, AppError> {
    let _guard = FlightGuard {
        registry,
        path: path.clone(),
    };

    let _permit = permits
        .acquire_owned()
        .await
        .map_err(|e| AppError::Model(ModelError::Crashed(e.to_string())))?;

    let started = std::time::Instant::now();
    let scored_path = path.clone();
    let scores = tokio::task::spawn_blocking(move || classifier.score(&scored_path))
        .await
        .map_err(|e| AppError::Model(ModelError::Crashed(format!("classifier panicked: {}", e))))?;

    let result = scores.and_then(|s| normalize(&s));
    match &result {
        Ok(r) => tracing::info!(
            path = %path.display(),
            label = %r.predicted_label,
            confidence = r.confidence,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "classification finished"
        ),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "classification failed"),
    }
    result
}

/// Turn raw fake/real probabilities into a result.
///
/// An exact tie is reported as real.
pub fn normalize(scores: &ClassScores) -> Result<ClassificationResult, AppError> {
    let probs = &scores.probabilities;
    if probs.len() != 2 {
        return Err(AppError::malformed_output(format!(
            "expected 2 class probabilities, got {}",
            probs.len()
        )));
    }

    let (fake, real) = (probs[0] as f64, probs[1] as f64);
    let in_range = |p: f64| p.is_finite() && (-SUM_TOLERANCE..=1.0 + SUM_TOLERANCE).contains(&p);
    if !in_range(fake) || !in_range(real) {
        return Err(AppError::malformed_output(format!(
            "probabilities out of range: fake={}, real={}",
            fake, real
        )));
    }

    let sum = fake + real;
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(AppError::malformed_output(format!(
            "probabilities sum to {}, expected 1",
            sum
        )));
    }

    let fake_probability = (fake / sum).clamp(0.0, 1.0);
    let real_probability = 1.0 - fake_probability;
    let is_fake = fake_probability > real_probability;

    Ok(ClassificationResult {
        is_fake,
        predicted_label: if is_fake { "fake" } else { "real" }.to_string(),
        confidence: if is_fake { fake_probability } else { real_probability },
        fake_probability,
        real_probability,
    })
}
