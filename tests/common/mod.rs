#![allow(dead_code)]

use deepfake_lense_lib::models::classify_types::ClassScores;
use deepfake_lense_lib::services::classifier::Classifier;
use deepfake_lense_lib::AppError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// `<tmp>/Fake/fake_i.png` and `<tmp>/Real/real_i.jpg`.
pub fn corpus(fake: usize, real: usize) -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let fake_dir = tmp.path().join("Fake");
    let real_dir = tmp.path().join("Real");
    fs::create_dir_all(&fake_dir).unwrap();
    fs::create_dir_all(&real_dir).unwrap();
    for i in 0..fake {
        fs::write(fake_dir.join(format!("fake_{}.png", i)), b"x").unwrap();
    }
    for i in 0..real {
        fs::write(real_dir.join(format!("real_{}.jpg", i)), b"x").unwrap();
    }
    tmp
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Counts calls, optionally sleeping, failing the first N calls, or blocking one path.
pub struct StubClassifier {
    pub calls: AtomicUsize,
    pub delay: Duration,
    pub fail_first: usize,
    pub scores: (f32, f32),
    pub gated_path: Option<PathBuf>,
    gate: Mutex<bool>,
    gate_cv: Condvar,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail_first: 0,
            scores: (0.9, 0.1),
            gated_path: None,
            gate: Mutex::new(false),
            gate_cv: Condvar::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn with_scores(mut self, fake: f32, real: f32) -> Self {
        self.scores = (fake, real);
        self
    }

    /// Calls for `path` block until `open_gate` is called.
    pub fn gated_on(mut self, path: PathBuf) -> Self {
        self.gated_path = Some(fs::canonicalize(path).unwrap());
        self
    }

    pub fn open_gate(&self) {
        *self.gate.lock().unwrap() = true;
        self.gate_cv.notify_all();
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for StubClassifier {
    fn score(&self, path: &Path) -> Result<ClassScores, AppError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);

        if self.gated_path.as_deref() == Some(path) {
            let mut open = self.gate.lock().unwrap();
            while !*open {
                open = self.gate_cv.wait(open).unwrap();
            }
        }

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if n < self.fail_first {
            return Err(AppError::inference("model exploded"));
        }
        Ok(ClassScores::new(self.scores.0, self.scores.1))
    }
}

/// Always panics inside the blocking pool.
pub struct PanickingClassifier;

impl Classifier for PanickingClassifier {
    fn score(&self, _path: &Path) -> Result<ClassScores, AppError> {
        panic!("decoder blew up");
    }
}

/// Returns three class probabilities.
pub struct ThreeClassClassifier;

impl Classifier for ThreeClassClassifier {
    fn score(&self, _path: &Path) -> Result<ClassScores, AppError> {
        Ok(ClassScores {
            probabilities: vec![0.2, 0.3, 0.5],
        })
    }
}
