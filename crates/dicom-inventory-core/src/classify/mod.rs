pub mod image_type;
pub mod patterns;

pub use image_type::{fieldmap_subtag, image_type_tag, normalize, RawImageType};
pub use patterns::{PatternEntry, PatternStore, PatternTable};

pub const UNKNOWN: &str = "unknown";
pub const SCOUT: &str = "scout";
pub const REPORT: &str = "report";
pub const FIELDMAP: &str = "fmap";

/// Maps series descriptions to fine modality labels using a fixed rule table.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: PatternTable,
}

impl Classifier {
    pub fn new(table: PatternTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Label of the first rule with a pattern contained in `description`
    /// (case-insensitive), or `"unknown"`.
    pub fn classify(&self, description: &str) -> &str {
        let lowered = description.to_lowercase();
        self.table
            .entries
            .iter()
            .find(|entry| entry.patterns.iter().any(|p| lowered.contains(p.as_str())))
            .map(|entry| entry.label.as_str())
            .unwrap_or(UNKNOWN)
    }
}

/// Top-level BIDS container for a fine label; empty when uncategorized.
pub fn container(fine_modality: &str) -> &'static str {
    match fine_modality {
        "T1w" | "T2w" | "FLAIR" | "MTw" | "PDw" | "scout" | "report" | "refscan" => "anat",
        "bold" | "SBRef" => "func",
        "dwi" => "dwi",
        "fmap" => "fmap",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_common_descriptions() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("T1w_MPRAGE_sag"), "T1w");
        assert_eq!(classifier.classify("t2_flair_tra"), "FLAIR");
        assert_eq!(classifier.classify("AAHead_Scout_32ch"), "scout");
        assert_eq!(classifier.classify("rest_fMRI_ses-pre"), "bold");
        assert_eq!(classifier.classify("task-rest_SBRef"), "bold");
        assert_eq!(classifier.classify("cmrr_SBRef"), "SBRef");
        assert_eq!(classifier.classify("DTI_64dir"), "dwi");
        assert_eq!(classifier.classify("gre_field_mapping"), "fmap");
        assert_eq!(classifier.classify("PhysioLog"), "physio");
        assert_eq!(classifier.classify("MT_on_3d"), "MTw");
        assert_eq!(classifier.classify("PDw_tra"), "PDw");
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(Classifier::default().classify("something else"), UNKNOWN);
        assert_eq!(Classifier::default().classify(""), UNKNOWN);
    }

    #[test]
    fn test_earlier_rule_wins() {
        let classifier = Classifier::default();
        // Both "t1w" and "phase" match; T1w is listed first.
        assert_eq!(classifier.classify("t1w_phase"), "T1w");
        // Both "localizer" and "report" match; scout precedes report.
        assert_eq!(classifier.classify("localizer report"), "scout");
    }

    #[test]
    fn test_order_of_custom_table_is_respected() {
        let table = PatternTable {
            entries: vec![
                PatternEntry {
                    label: "fmap".to_string(),
                    patterns: vec!["phase".to_string()],
                },
                PatternEntry {
                    label: "T1w".to_string(),
                    patterns: vec!["t1w".to_string()],
                },
            ],
        };
        assert_eq!(Classifier::new(table).classify("t1w_phase"), "fmap");
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = Classifier::default();
        let first = classifier.classify("ep2d_bold_task-nback").to_string();
        for _ in 0..10 {
            assert_eq!(classifier.classify("ep2d_bold_task-nback"), first);
        }
    }

    #[test]
    fn test_container() {
        assert_eq!(container("T1w"), "anat");
        assert_eq!(container("scout"), "anat");
        assert_eq!(container("SBRef"), "func");
        assert_eq!(container("dwi"), "dwi");
        assert_eq!(container("fmap"), "fmap");
        assert_eq!(container("physio"), "");
        assert_eq!(container(UNKNOWN), "");
    }
}
