pub mod fieldmap;
pub mod tsv;

use crate::aggregate::Aggregate;
use crate::classify::{self, FIELDMAP, REPORT, SCOUT};
use crate::extract::SubjectKey;
use crate::identity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub use fieldmap::consolidate_fieldmaps;
pub use tsv::{read_inventory, write_inventory, COLUMNS};

/// One line of the inventory table. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub subject: String,
    #[serde(rename = "BIDS_name")]
    pub bids_name: String,
    pub session: String,
    pub source_folder: String,
    pub include: u8,
    pub sequence: String,
    pub series_uid: String,
    pub rep: Option<u32>,
    pub acq_time: String,
    pub image_type: String,
    pub modality: String,
    pub modality_bids: String,
    pub n_files: usize,
    #[serde(rename = "GivenName")]
    pub given_name: String,
    #[serde(rename = "FamilyName")]
    pub family_name: String,
    #[serde(rename = "PatientID")]
    pub patient_id: String,
    #[serde(rename = "PatientSex")]
    pub patient_sex: String,
    #[serde(rename = "PatientAge")]
    pub patient_age: String,
    #[serde(rename = "StudyDescription")]
    pub study_description: String,
}

impl InventoryRow {
    pub fn is_fieldmap(&self) -> bool {
        self.modality == FIELDMAP
    }
}

/// Scout, report and physlog series are skipped by default.
pub fn default_include(modality: &str, description: &str) -> u8 {
    if modality == SCOUT || modality == REPORT || description.to_lowercase().contains("physlog") {
        0
    } else {
        1
    }
}

/// Run identity assignment, row building, field-map consolidation and the
/// final ordering over an aggregate.
pub fn build_inventory(aggregate: &Aggregate, fmap_time_bucket: usize) -> Vec<InventoryRow> {
    let codes = identity::assign_subject_codes(aggregate.demographics.keys());
    debug!("Assigned subject codes: {:?}", codes);

    let rows = build_rows(aggregate, &codes);
    let rows = consolidate_fieldmaps(rows, fmap_time_bucket);
    finalize(rows)
}

/// One row per aggregated series, in aggregate order. Non-field-map rows get
/// their repetition index here; field-map rows are numbered after merging.
pub fn build_rows(
    aggregate: &Aggregate,
    codes: &BTreeMap<SubjectKey, String>,
) -> Vec<InventoryRow> {
    let mut rows = Vec::with_capacity(aggregate.series.len());
    let mut repeats: HashMap<(SubjectKey, String, String, String), Vec<usize>> = HashMap::new();

    for ((subject, folder, series), stats) in &aggregate.series {
        let demo = aggregate
            .demographics
            .get(subject)
            .cloned()
            .unwrap_or_default();

        if stats.modality != FIELDMAP {
            // Duplicate localizers differ only in an irrelevant image type.
            let type_part = if stats.modality == SCOUT {
                String::new()
            } else {
                stats.image_type.clone()
            };
            repeats
                .entry((
                    subject.clone(),
                    folder.clone(),
                    series.description.clone(),
                    type_part,
                ))
                .or_default()
                .push(rows.len());
        }

        rows.push(InventoryRow {
            subject: String::new(),
            bids_name: codes.get(subject).cloned().unwrap_or_default(),
            session: aggregate.session_label(subject, folder),
            source_folder: folder.clone(),
            include: default_include(&stats.modality, &series.description),
            sequence: series.description.clone(),
            series_uid: series.uid.clone(),
            rep: None,
            acq_time: stats.acq_time.clone(),
            image_type: stats.image_type.clone(),
            modality: stats.modality.clone(),
            modality_bids: classify::container(&stats.modality).to_string(),
            n_files: stats.n_files,
            given_name: demo.given_name,
            family_name: demo.family_name,
            patient_id: demo.patient_id,
            patient_sex: demo.sex,
            patient_age: demo.age,
            study_description: demo.study_description,
        });
    }

    for mut indices in repeats.into_values() {
        if indices.len() < 2 {
            continue;
        }
        indices.sort_by(|&a, &b| {
            (&rows[a].acq_time, &rows[a].series_uid).cmp(&(&rows[b].acq_time, &rows[b].series_uid))
        });
        for (n, idx) in indices.into_iter().enumerate() {
            rows[idx].rep = Some(n as u32 + 1);
        }
    }

    rows
}

/// Sort by study, subject code, folder and description, keeping the
/// incoming order among equal keys, then show each subject's given name on
/// its first row only.
pub fn finalize(mut rows: Vec<InventoryRow>) -> Vec<InventoryRow> {
    rows.sort_by(|a, b| {
        (
            &a.study_description,
            &a.bids_name,
            &a.source_folder,
            &a.sequence,
        )
            .cmp(&(
                &b.study_description,
                &b.bids_name,
                &b.source_folder,
                &b.sequence,
            ))
    });

    let mut previous: Option<(String, String)> = None;
    for row in &mut rows {
        let block = (row.study_description.clone(), row.bids_name.clone());
        if previous.as_ref() != Some(&block) {
            row.subject = row.given_name.clone();
            previous = Some(block);
        } else {
            row.subject.clear();
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Demographics, Observation, SeriesKey};

    fn obs(subject: &str, folder: &str, desc: &str, uid: &str, modality: &str) -> Observation {
        Observation {
            subject: SubjectKey {
                subject: subject.to_string(),
                study: "Study".to_string(),
            },
            folder: folder.to_string(),
            series: SeriesKey {
                description: desc.to_string(),
                uid: uid.to_string(),
            },
            modality: modality.to_string(),
            image_type: String::new(),
            acq_time: String::new(),
            session: None,
            demographics: Demographics {
                given_name: subject.to_string(),
                study_description: "Study".to_string(),
                ..Demographics::default()
            },
        }
    }

    #[test]
    fn test_default_include() {
        assert_eq!(default_include("scout", "localizer"), 0);
        assert_eq!(default_include("report", "PhoenixZIPReport"), 0);
        assert_eq!(default_include("physio", "Resp_PhysLog"), 0);
        assert_eq!(default_include("T1w", "t1w_mprage"), 1);
        assert_eq!(default_include("unknown", "something"), 1);
    }

    #[test]
    fn test_reps_follow_acquisition_time() {
        let mut a = obs("Alice", "f", "rest_bold", "9.9", "bold");
        a.acq_time = "100000".to_string();
        let mut b = obs("Alice", "f", "rest_bold", "1.1", "bold");
        b.acq_time = "110000".to_string();
        let mut c = obs("Alice", "f", "rest_bold", "5.5", "bold");
        c.acq_time = "120000".to_string();
        let single = obs("Alice", "f", "t1w", "2.2", "T1w");

        let agg = Aggregate::from_observations([&a, &b, &c, &single]);
        let rows = build_inventory(&agg, 4);

        let rep_of = |uid: &str| rows.iter().find(|r| r.series_uid == uid).unwrap().rep;
        assert_eq!(rep_of("9.9"), Some(1));
        assert_eq!(rep_of("1.1"), Some(2));
        assert_eq!(rep_of("5.5"), Some(3));
        assert_eq!(rep_of("2.2"), None);
    }

    #[test]
    fn test_scout_reps_ignore_image_type() {
        let mut a = obs("Alice", "f", "localizer", "1", "scout");
        a.image_type = "M".to_string();
        let mut b = obs("Alice", "f", "localizer", "2", "scout");
        b.image_type = "OTHER".to_string();
        let mut c = obs("Alice", "f", "dwi", "3", "dwi");
        c.image_type = "DIFFUSION".to_string();
        let mut d = obs("Alice", "f", "dwi", "4", "dwi");
        d.image_type = "ADC".to_string();

        let agg = Aggregate::from_observations([&a, &b, &c, &d]);
        let rows = build_inventory(&agg, 4);
        let rep_of = |uid: &str| rows.iter().find(|r| r.series_uid == uid).unwrap().rep;
        assert_eq!(rep_of("1"), Some(1));
        assert_eq!(rep_of("2"), Some(2));
        assert_eq!(rep_of("3"), None);
        assert_eq!(rep_of("4"), None);
        assert!(rows.iter().filter(|r| r.modality == "scout").all(|r| r.include == 0));
    }

    #[test]
    fn test_reps_are_per_folder() {
        let a = obs("Alice", "one", "t1w", "1", "T1w");
        let b = obs("Alice", "two", "t1w", "2", "T1w");
        let agg = Aggregate::from_observations([&a, &b]);
        let rows = build_inventory(&agg, 4);
        assert!(rows.iter().all(|r| r.rep.is_none()));
    }

    #[test]
    fn test_ordering_and_subject_column() {
        let a = obs("Bob", "b", "t1w", "1", "T1w");
        let b = obs("Bob", "a", "t2w", "2", "T2w");
        let c = obs("Alice", "z", "t1w", "3", "T1w");
        let d = obs("Alice", "z", "dwi", "4", "dwi");

        let agg = Aggregate::from_observations([&a, &b, &c, &d]);
        let rows = build_inventory(&agg, 4);

        let order: Vec<(&str, &str, &str)> = rows
            .iter()
            .map(|r| (r.bids_name.as_str(), r.source_folder.as_str(), r.sequence.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("sub-001", "z", "dwi"),
                ("sub-001", "z", "t1w"),
                ("sub-002", "a", "t2w"),
                ("sub-002", "b", "t1w"),
            ]
        );
        let subjects: Vec<&str> = rows.iter().map(|r| r.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Alice", "", "Bob", ""]);
        assert_eq!(rows[0].modality_bids, "dwi");
        assert_eq!(rows[2].modality_bids, "anat");
    }
}
