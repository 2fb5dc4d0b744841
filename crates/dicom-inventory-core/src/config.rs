use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PATTERNS_PATH: &str = "dicom_patterns.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Glob patterns for files and directories skipped during the walk.
    pub ignore_patterns: Vec<String>,
    /// Extension (without dot, case-insensitive) of files handed to the decoder.
    pub file_extension: String,
    /// Share of the available cores used for header decoding.
    pub worker_fraction: f64,
    /// Explicit worker count; overrides `worker_fraction` when set.
    pub jobs: Option<usize>,
    /// Number of leading acquisition-time characters that must agree for
    /// magnitude/phase field-map series to be merged. 4 keeps HHMM.
    pub fmap_time_bucket: usize,
    /// Where the user's classification pattern override is persisted.
    pub patterns_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: Vec::new(),
            file_extension: "dcm".to_string(),
            worker_fraction: 0.5,
            jobs: None,
            fmap_time_bucket: 4,
            patterns_path: DEFAULT_PATTERNS_PATH.to_string(),
        }
    }
}

impl AppConfig {
    /// Number of decode workers for this machine.
    pub fn worker_count(&self) -> usize {
        if let Some(jobs) = self.jobs {
            return jobs.max(1);
        }
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        ((cores as f64 * self.worker_fraction).floor() as usize).max(1)
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("DICOM_INVENTORY").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
