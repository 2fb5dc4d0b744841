pub mod aggregate;
pub mod classify;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod extract;
pub mod identity;
pub mod participants;
pub mod progress;
pub mod scanner;
pub mod table;

pub use classify::{Classifier, PatternStore, PatternTable};
pub use config::AppConfig;
pub use decoder::{DicomDecoder, HeaderDecoder, HeaderRecord};
pub use engine::{InventoryEngine, ScanResult};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use table::InventoryRow;
