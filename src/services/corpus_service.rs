use crate::models::catalog_types::{Category, SampleDescriptor};
use std::path::Path;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan `<base_dir>/Fake` and `<base_dir>/Real` (non-recursive).
///
/// A missing category directory contributes nothing; an empty result is not
/// an error here, callers decide how to surface it.
pub fn scan_corpus(base_dir: &Path) -> Vec<SampleDescriptor> {
    let mut samples = Vec::new();
    for category in Category::ALL {
        scan_category(base_dir, category, &mut samples);
    }
    tracing::debug!(
        base_dir = %base_dir.display(),
        count = samples.len(),
        "corpus scan finished"
    );
    samples
}

fn scan_category(base_dir: &Path, category: Category, out: &mut Vec<SampleDescriptor>) {
    let dir = base_dir.join(category.dir_name());
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "category directory absent, skipping");
        return;
    }

    // Full paths are published canonicalized so they match gateway keys.
    let dir = match std::fs::canonicalize(&dir) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot resolve category directory");
            return;
        }
    };

    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable corpus entry");
                continue;
            }
        };

        // `Path::is_file` follows symlinks; the walk itself does not.
        if !is_image_file(entry.path()) || !entry.path().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        let relative_url = format!("{}/{}", category.dir_name(), file_name);
        out.push(SampleDescriptor::new(
            entry.path().to_path_buf(),
            relative_url,
            category,
        ));
    }
}
