use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Pattern file error: {0}")]
    Patterns(#[from] toml::de::Error),

    #[error("Pattern serialization error: {0}")]
    PatternsSerialize(#[from] toml::ser::Error),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Could not decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("No acquisition files under {}", .0.display())]
    NoAcquisitions(PathBuf),
}
