use crate::error::AppError;
use crate::models::catalog_types::{Catalog, PageLookup};
use crate::services::{corpus_service, pagination};
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Process-wide shuffled catalog.
///
/// Readers take a cheap snapshot of the published `Arc<Catalog>`. Builds are
/// serialized by `build_lock` and re-check after acquiring it, so concurrent
/// first readers share a single scan. A catalog is fully built before it is
/// swapped in, so no reader ever sees a partial one.
#[derive(Clone)]
pub struct CatalogCache {
    base_dir: PathBuf,
    current: Arc<RwLock<Option<Arc<Catalog>>>>,
    build_lock: Arc<Mutex<()>>,
    scans: Arc<AtomicUsize>,
}

impl CatalogCache {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            current: Arc::new(RwLock::new(None)),
            build_lock: Arc::new(Mutex::new(())),
            scans: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Number of corpus scans performed so far.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn is_built(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Return the published catalog, building it on first use.
    ///
    /// An empty catalog is a valid published state and is returned as-is;
    /// it is not rebuilt on later reads.
    pub async fn get_catalog(&self) -> Result<Arc<Catalog>, AppError> {
        if let Some(catalog) = self.snapshot() {
            return Ok(catalog);
        }

        let _guard = self.build_lock.lock().await;
        if let Some(catalog) = self.snapshot() {
            return Ok(catalog);
        }

        let catalog = self.build().await?;
        self.publish(Some(catalog.clone()));
        Ok(catalog)
    }

    /// Drop the published catalog; the next `get_catalog` scans again.
    pub async fn invalidate(&self) {
        let _guard = self.build_lock.lock().await;
        self.publish(None);
        tracing::info!(base_dir = %self.base_dir.display(), "catalog invalidated");
    }

    /// Scan and shuffle a fresh catalog, replacing the current one in one swap.
    pub async fn rebuild(&self) -> Result<Arc<Catalog>, AppError> {
        let _guard = self.build_lock.lock().await;
        let catalog = self.build().await?;
        self.publish(Some(catalog.clone()));
        Ok(catalog)
    }

    pub async fn get_page(&self, page_number: usize, page_size: usize) -> Result<PageLookup, AppError> {
        if page_number < 1 {
            return Err(AppError::invalid_argument(format!(
                "page number must be at least 1, got {}",
                page_number
            )));
        }
        let catalog = self.get_catalog().await?;
        pagination::get_page(&catalog, page_number, page_size, &self.base_dir)
    }

    async fn build(&self) -> Result<Arc<Catalog>, AppError> {
        let base_dir = self.base_dir.clone();
        let samples = tokio::task::spawn_blocking(move || {
            let mut samples = corpus_service::scan_corpus(&base_dir);
            samples.shuffle(&mut rand::rng());
            samples
        })
        .await
        .map_err(|e| AppError::Io(format!("Catalog scan task failed: {}", e)))?;

        self.scans.fetch_add(1, Ordering::SeqCst);

        if samples.is_empty() {
            tracing::warn!(base_dir = %self.base_dir.display(), "catalog built from an empty corpus");
        } else {
            tracing::info!(
                base_dir = %self.base_dir.display(),
                count = samples.len(),
                "catalog built"
            );
        }

        Ok(Arc::new(Catalog::new(samples)))
    }

    fn snapshot(&self) -> Option<Arc<Catalog>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn publish(&self, catalog: Option<Arc<Catalog>>) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = catalog;
    }
}
