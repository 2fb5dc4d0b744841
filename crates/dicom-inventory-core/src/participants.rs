//! Files derived from an inventory for the downstream conversion step.

use crate::error::Error;
use crate::table::tsv::write_records_to;
use crate::table::InventoryRow;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

pub const PARTICIPANTS_FILE: &str = "participants.tsv";
pub const SUBJECT_MAPPING_FILE: &str = "subject_mapping.tsv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub participant_id: String,
    pub given_name: String,
    pub sex: String,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectMapping {
    #[serde(rename = "GivenName")]
    pub given_name: String,
    #[serde(rename = "BIDS_name")]
    pub bids_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectIdEntry {
    pub source_folder: String,
    #[serde(rename = "BIDS_name")]
    pub bids_name: String,
}

/// Leading number of a DICOM age string without leading zeros
/// (`"032Y"` -> `"32"`). Values without a leading digit are returned as is.
pub fn parse_age(value: &str) -> String {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return value.to_string();
    }
    match digits.trim_start_matches('0') {
        "" => "0".to_string(),
        age => age.to_string(),
    }
}

/// Distinct study descriptions in first-seen order. Subject codes restart
/// in every study, so the participant files are written per study.
pub fn studies(rows: &[InventoryRow]) -> Vec<&str> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|row| row.study_description.as_str())
        .filter(|study| seen.insert(*study))
        .collect()
}

/// Folder-safe dataset name for a study: runs of anything outside
/// `[0-9A-Za-z_-]` become `_`, outer underscores are dropped.
pub fn dataset_name(study: &str) -> String {
    static UNSAFE_RE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE_RE.get_or_init(|| Regex::new(r"[^0-9A-Za-z_-]+").expect("valid dataset regex"));
    let name = re.replace_all(study.trim(), "_");
    match name.trim_matches('_') {
        "" => "n_a".to_string(),
        name => name.to_string(),
    }
}

/// One entry per subject code of `study`, demographics from its first row.
pub fn participants(rows: &[InventoryRow], study: &str) -> Vec<Participant> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| row.study_description == study)
        .filter(|row| seen.insert(row.bids_name.as_str()))
        .map(|row| Participant {
            participant_id: row.bids_name.clone(),
            given_name: row.given_name.clone(),
            sex: row.patient_sex.clone(),
            age: parse_age(&row.patient_age),
        })
        .collect()
}

/// Distinct (given name, subject code) pairs of `study` in first-seen order.
pub fn subject_mapping(rows: &[InventoryRow], study: &str) -> Vec<SubjectMapping> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| row.study_description == study)
        .filter(|row| seen.insert((row.given_name.as_str(), row.bids_name.as_str())))
        .map(|row| SubjectMapping {
            given_name: row.given_name.clone(),
            bids_name: row.bids_name.clone(),
        })
        .collect()
}

/// Source folder to subject code for every included row.
pub fn subject_id_map(rows: &[InventoryRow]) -> BTreeMap<String, String> {
    rows.iter()
        .filter(|row| row.include == 1)
        .map(|row| (row.source_folder.clone(), row.bids_name.clone()))
        .collect()
}

/// Write `participants.tsv` and `subject_mapping.tsv` for one study into
/// `out_dir`. Nothing is written when the study has no rows.
pub fn write_participants(
    rows: &[InventoryRow],
    study: &str,
    out_dir: &Path,
) -> Result<usize, Error> {
    let entries = participants(rows, study);
    if entries.is_empty() {
        return Ok(0);
    }
    write_records_to(&out_dir.join(PARTICIPANTS_FILE), &entries)?;
    write_records_to(&out_dir.join(SUBJECT_MAPPING_FILE), &subject_mapping(rows, study))?;
    info!(
        "{} participants of '{}' written to {}",
        entries.len(),
        study,
        out_dir.display()
    );
    Ok(entries.len())
}

/// Write the participant files of every study into its own
/// `out_dir/<dataset name>` folder. Returns each folder with its count.
pub fn write_participants_by_study(
    rows: &[InventoryRow],
    out_dir: &Path,
) -> Result<Vec<(PathBuf, usize)>, Error> {
    let mut written = Vec::new();
    for study in studies(rows) {
        let dir = out_dir.join(dataset_name(study));
        let count = write_participants(rows, study, &dir)?;
        written.push((dir, count));
    }
    Ok(written)
}

pub fn write_subject_id_map(rows: &[InventoryRow], path: &Path) -> Result<usize, Error> {
    let entries: Vec<SubjectIdEntry> = subject_id_map(rows)
        .into_iter()
        .map(|(source_folder, bids_name)| SubjectIdEntry {
            source_folder,
            bids_name,
        })
        .collect();
    write_records_to(path, &entries)?;
    info!("Subject map with {} folders written to {}", entries.len(), path.display());
    Ok(entries.len())
}
