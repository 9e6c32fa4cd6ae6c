use crate::models::catalog_types::Category;
use crate::services::catalog_cache::CatalogCache;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// OS watcher plus the directories it currently covers.
struct Watches {
    watcher: RecommendedWatcher,
    dirs: HashSet<PathBuf>,
}

impl Watches {
    /// Watch the base directory and whichever category directories exist now.
    fn refresh(&mut self, base_dir: &Path) -> usize {
        self.dirs.retain(|d| d.is_dir());

        let candidates = std::iter::once(base_dir.to_path_buf())
            .chain(Category::ALL.iter().map(|c| base_dir.join(c.dir_name())));
        for dir in candidates {
            if !dir.is_dir() || self.dirs.contains(&dir) {
                continue;
            }
            match self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    self.dirs.insert(dir);
                }
                Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "cannot watch directory"),
            }
        }
        self.dirs.len()
    }
}

/// Rebuilds the catalog after the corpus changes.
///
/// The base directory is watched too, so a category directory created after
/// startup is picked up on the next rebuild. Dropping the watcher stops the
/// OS watch and ends the debounce task.
pub struct CorpusWatcher {
    _watches: Arc<Mutex<Watches>>,
}

impl CorpusWatcher {
    /// Must be called from inside a tokio runtime.
    pub fn start(cache: CatalogCache) -> Result<Self, notify::Error> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();

        let watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                        let _ = tx.send(());
                    }
                    _ => {}
                }
            }
        })?;

        let mut watches = Watches {
            watcher,
            dirs: HashSet::new(),
        };
        let watched = watches.refresh(cache.base_dir());
        tracing::info!(
            base_dir = %cache.base_dir().display(),
            directories = watched,
            "watching corpus for changes"
        );

        let watches = Arc::new(Mutex::new(watches));
        let weak: Weak<Mutex<Watches>> = Arc::downgrade(&watches);

        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                tokio::time::sleep(DEBOUNCE).await;
                while rx.try_recv().is_ok() {}

                let Some(watches) = weak.upgrade() else {
                    break;
                };
                watches
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .refresh(cache.base_dir());
                drop(watches);

                match cache.rebuild().await {
                    Ok(catalog) => {
                        tracing::info!(count = catalog.len(), "catalog rebuilt after corpus change")
                    }
                    Err(e) => tracing::error!(error = %e, "catalog rebuild after corpus change failed"),
                }
            }
        });

        Ok(Self { _watches: watches })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    async fn wait_for(cache: &CatalogCache, cond: impl Fn(usize, usize) -> bool) -> bool {
        for _ in 0..50 {
            let len = cache.get_catalog().await.unwrap().len();
            if cond(len, cache.scan_count()) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        false
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn burst_of_writes_triggers_one_rebuild() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Fake")).unwrap();
        fs::create_dir_all(tmp.path().join("Real")).unwrap();
        fs::write(tmp.path().join("Fake").join("a.png"), b"x").unwrap();

        let cache = CatalogCache::new(tmp.path());
        assert_eq!(cache.get_catalog().await.unwrap().len(), 1);
        assert_eq!(cache.scan_count(), 1);

        let _watcher = CorpusWatcher::start(cache.clone()).unwrap();
        for i in 0..3 {
            fs::write(tmp.path().join("Real").join(format!("x{}.png", i)), b"x").unwrap();
        }

        assert!(wait_for(&cache, |len, _| len == 4).await);
        tokio::time::sleep(DEBOUNCE * 3).await;
        assert_eq!(cache.scan_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn category_created_after_start_is_watched() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Real")).unwrap();
        fs::write(tmp.path().join("Real").join("r.jpg"), b"x").unwrap();

        let cache = CatalogCache::new(tmp.path());
        assert_eq!(cache.get_catalog().await.unwrap().len(), 1);

        let _watcher = CorpusWatcher::start(cache.clone()).unwrap();
        let fake = tmp.path().join("Fake");
        fs::create_dir_all(&fake).unwrap();
        fs::write(fake.join("f1.png"), b"x").unwrap();
        assert!(wait_for(&cache, |len, _| len == 2).await);

        let scans = cache.scan_count();
        tokio::time::sleep(DEBOUNCE * 2).await;
        fs::write(fake.join("f2.png"), b"x").unwrap();
        assert!(wait_for(&cache, |len, count| len == 3 && count > scans).await);
    }

    #[tokio::test]
    async fn dropping_watcher_stops_rebuilds() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Real")).unwrap();

        let cache = CatalogCache::new(tmp.path());
        cache.get_catalog().await.unwrap();
        drop(CorpusWatcher::start(cache.clone()).unwrap());

        fs::write(tmp.path().join("Real").join("late.png"), b"x").unwrap();
        tokio::time::sleep(DEBOUNCE * 3).await;
        assert_eq!(cache.scan_count(), 1);
    }
}
