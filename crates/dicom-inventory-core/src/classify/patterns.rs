use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One classification rule: a fine modality label and the lower-case
/// substrings that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub label: String,
    pub patterns: Vec<String>,
}

/// Ordered rule table. Earlier entries take priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternTable {
    #[serde(rename = "pattern", default)]
    pub entries: Vec<PatternEntry>,
}

const DEFAULT_PATTERNS: &[(&str, &[&str])] = &[
    ("T1w", &["t1w", "mprage", "tfl3d"]),
    ("T2w", &["t2w", "space", "tse"]),
    ("FLAIR", &["flair"]),
    ("MTw", &["mtw", "mt_on", "mt_off", "mtr"]),
    ("PDw", &["pdw", "pd_", "proton"]),
    ("scout", &["localizer", "scout"]),
    (
        "report",
        &["phoenixzipreport", "phoenix document", ".pdf", "report"],
    ),
    ("refscan", &["type-ref", "reference", "refscan"]),
    ("bold", &["fmri", "bold", "task-"]),
    ("SBRef", &["sbref"]),
    ("dwi", &["dti", "dwi", "diff"]),
    (
        "fmap",
        &["gre_field", "fieldmapping", "_fmap", "fmap", "phase", "magnitude"],
    ),
    ("physio", &["physiolog", "physio", "pulse", "resp"]),
];

impl Default for PatternTable {
    fn default() -> Self {
        let entries = DEFAULT_PATTERNS
            .iter()
            .map(|(label, patterns)| PatternEntry {
                label: label.to_string(),
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
            })
            .collect();
        Self { entries }
    }
}

impl PatternTable {
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let mut table: PatternTable = toml::from_str(text)?;
        // Matching is done against a lower-cased description.
        for entry in &mut table.entries {
            for pattern in &mut entry.patterns {
                *pattern = pattern.to_lowercase();
            }
        }
        Ok(table)
    }

    pub fn to_toml(&self) -> Result<String, Error> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }
}

/// Persisted user override of the pattern table.
#[derive(Debug, Clone)]
pub struct PatternStore {
    path: PathBuf,
}

impl PatternStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Active table: the persisted override when one exists, the built-in
    /// table otherwise.
    pub fn load_override(&self) -> Result<PatternTable, Error> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let table = PatternTable::from_toml(&text)?;
                info!(
                    "Loaded {} classification rules from {}",
                    table.entries.len(),
                    self.path.display()
                );
                Ok(table)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No pattern override at {}, using defaults", self.path.display());
                Ok(PatternTable::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, table: &PatternTable) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, table.to_toml()?)?;
        info!("Pattern table written to {}", self.path.display());
        Ok(())
    }

    /// Clear the persisted override and return the built-in table.
    pub fn restore_default(&self) -> Result<PatternTable, Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => info!("Removed pattern override {}", self.path.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        Ok(PatternTable::default())
    }
}
