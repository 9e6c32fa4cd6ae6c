use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const CONFIG_ENV: &str = "DEEPFAKE_LENSE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "deepfake-lense.toml";

/// Service configuration. File values first, environment variables on top.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the `Fake` and `Real` sample folders
    pub corpus_dir: PathBuf,
    /// Web assets served under /web_static
    pub static_dir: PathBuf,
    pub bind_addr: String,
    pub page_size: usize,
    /// Exported model: model.onnx, config.json, optional preprocessor_config.json
    pub model_dir: PathBuf,
    pub use_gpu: bool,
    pub max_concurrent_inferences: usize,
    /// 0 disables the per-request bound
    pub inference_timeout_secs: u64,
    pub watch_corpus: bool,
    pub eager_catalog: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("data/test"),
            static_dir: PathBuf::from("web_static"),
            bind_addr: "127.0.0.1:5000".to_string(),
            page_size: 10,
            model_dir: PathBuf::from("model/final_model"),
            use_gpu: true,
            max_concurrent_inferences: 2,
            inference_timeout_secs: 120,
            watch_corpus: false,
            eager_catalog: true,
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self, AppError> {
        let explicit = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let mut config = match &explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), AppError> {
        if let Some(v) = lookup("CORPUS_DIR") {
            self.corpus_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("STATIC_DIR") {
            self.static_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = lookup("MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        override_parsed(&lookup, "PAGE_SIZE", &mut self.page_size)?;
        override_parsed(&lookup, "USE_GPU", &mut self.use_gpu)?;
        override_parsed(&lookup, "MAX_CONCURRENT_INFERENCES", &mut self.max_concurrent_inferences)?;
        override_parsed(&lookup, "INFERENCE_TIMEOUT_SECS", &mut self.inference_timeout_secs)?;
        override_parsed(&lookup, "WATCH_CORPUS", &mut self.watch_corpus)?;
        override_parsed(&lookup, "EAGER_CATALOG", &mut self.eager_catalog)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.page_size == 0 {
            return Err(AppError::Config("page_size must be at least 1".to_string()));
        }
        if self.max_concurrent_inferences == 0 {
            return Err(AppError::Config(
                "max_concurrent_inferences must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        (self.inference_timeout_secs > 0).then(|| Duration::from_secs(self.inference_timeout_secs))
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    slot: &mut T,
) -> Result<(), AppError> {
    if let Some(raw) = lookup(name) {
        *slot = raw.trim().parse().map_err(|_| {
            AppError::Config(format!("{} has invalid value {:?}", name, raw))
        })?;
    }
    Ok(())
}
