use crate::classify::{image_type_tag, Classifier};
use crate::decoder::HeaderRecord;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// One subject within one study.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubjectKey {
    pub subject: String,
    pub study: String,
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}||{}", self.subject, self.study)
    }
}

/// One acquisition within a subject folder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    pub description: String,
    pub uid: String,
}

/// Demographics copied from the first header seen for a subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demographics {
    pub given_name: String,
    pub family_name: String,
    pub patient_id: String,
    pub sex: String,
    pub age: String,
    pub study_description: String,
}

/// Facts extracted from a single decoded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub subject: SubjectKey,
    pub folder: String,
    pub series: SeriesKey,
    pub modality: String,
    pub image_type: String,
    pub acq_time: String,
    pub session: Option<String>,
    pub demographics: Demographics,
}

fn session_regex() -> &'static Regex {
    static SESSION_RE: OnceLock<Regex> = OnceLock::new();
    SESSION_RE.get_or_init(|| Regex::new(r"(?i)ses-([a-z0-9]+)").expect("valid session regex"))
}

/// `ses-<label>` marker embedded in a series description, label lower-cased.
pub fn session_tag(description: &str) -> Option<String> {
    session_regex()
        .captures(description)
        .map(|caps| format!("ses-{}", caps[1].to_lowercase()))
}

/// Folder label of `file` relative to the scan `root`. Files sitting directly
/// in the root get the root directory's own name.
pub fn folder_label(root: &Path, file: &Path) -> String {
    let parent = file.parent().unwrap_or(root);
    let relative = parent.strip_prefix(root).unwrap_or(parent);
    if relative.as_os_str().is_empty() {
        return root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn text_or(value: &Option<String>, fallback: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Turn one decoded header into an observation. Never fails.
pub fn extract(
    header: &HeaderRecord,
    root: &Path,
    file: &Path,
    classifier: &Classifier,
) -> Observation {
    let given_name = text_or(&header.given_name, "");
    let patient_id = text_or(&header.patient_id, "");
    let subject = if !given_name.is_empty() {
        given_name.clone()
    } else if !patient_id.is_empty() {
        patient_id.clone()
    } else {
        "UNKNOWN".to_string()
    };

    let study = match text_or(&header.study_description, "") {
        s if !s.is_empty() => s,
        _ => text_or(&header.study_name, "n/a"),
    };

    let description = text_or(&header.series_description, "n/a");
    let modality = classifier.classify(&description).to_string();
    let session = session_tag(&description);

    Observation {
        subject: SubjectKey {
            subject,
            study: study.clone(),
        },
        folder: folder_label(root, file),
        series: SeriesKey {
            description,
            uid: text_or(&header.series_instance_uid, ""),
        },
        modality,
        image_type: image_type_tag(&header.image_type),
        acq_time: text_or(&header.acquisition_time, ""),
        session,
        demographics: Demographics {
            given_name,
            family_name: text_or(&header.family_name, ""),
            patient_id,
            sex: text_or(&header.patient_sex, "n/a"),
            age: text_or(&header.patient_age, "n/a"),
            study_description: study,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RawImageType;
    use std::path::PathBuf;

    fn header() -> HeaderRecord {
        HeaderRecord {
            given_name: Some("Alice".to_string()),
            family_name: Some("Smith".to_string()),
            patient_id: Some("P001".to_string()),
            study_description: Some("Memory".to_string()),
            series_description: Some("T1w_MPRAGE".to_string()),
            series_instance_uid: Some("1.2.3".to_string()),
            image_type: RawImageType::Text("ORIGINAL\\PRIMARY\\M\\ND".to_string()),
            acquisition_time: Some("101500.000000 ".to_string()),
            patient_sex: Some("F".to_string()),
            patient_age: Some("032Y".to_string()),
            ..HeaderRecord::default()
        }
    }

    #[test]
    fn test_extract_full_header() {
        let root = PathBuf::from("/data/raw");
        let obs = extract(
            &header(),
            &root,
            &root.join("alice/scan1/img001.dcm"),
            &Classifier::default(),
        );
        assert_eq!(obs.subject.to_string(), "Alice||Memory");
        assert_eq!(obs.folder, "alice/scan1");
        assert_eq!(obs.series.description, "T1w_MPRAGE");
        assert_eq!(obs.series.uid, "1.2.3");
        assert_eq!(obs.modality, "T1w");
        assert_eq!(obs.image_type, "M");
        assert_eq!(obs.acq_time, "101500.000000");
        assert_eq!(obs.session, None);
        assert_eq!(obs.demographics.family_name, "Smith");
        assert_eq!(obs.demographics.age, "032Y");
        assert_eq!(obs.demographics.study_description, "Memory");
    }

    #[test]
    fn test_extract_fallbacks() {
        let root = PathBuf::from("/data/raw");
        let mut h = HeaderRecord {
            patient_id: Some(" P007 ".to_string()),
            study_name: Some("Pilot".to_string()),
            ..HeaderRecord::default()
        };
        let obs = extract(&h, &root, &root.join("x.dcm"), &Classifier::default());
        assert_eq!(obs.subject.subject, "P007");
        assert_eq!(obs.subject.study, "Pilot");
        assert_eq!(obs.folder, "raw");
        assert_eq!(obs.series.description, "n/a");
        assert_eq!(obs.acq_time, "");
        assert_eq!(obs.demographics.sex, "n/a");
        assert_eq!(obs.demographics.age, "n/a");

        h.patient_id = None;
        h.study_name = None;
        let obs = extract(&h, &root, &root.join("x.dcm"), &Classifier::default());
        assert_eq!(obs.subject.to_string(), "UNKNOWN||n/a");
    }

    #[test]
    fn test_session_tag() {
        assert_eq!(session_tag("rest_SES-Pre_bold"), Some("ses-pre".to_string()));
        assert_eq!(session_tag("t1w ses-01"), Some("ses-01".to_string()));
        assert_eq!(session_tag("t1w ses-"), None);
        assert_eq!(session_tag("sessions"), None);
    }

    #[test]
    fn test_folder_label_nested() {
        let root = PathBuf::from("/data/raw");
        assert_eq!(folder_label(&root, &root.join("a/b/c/f.dcm")), "a/b/c");
        assert_eq!(folder_label(&root, &root.join("f.dcm")), "raw");
    }
}
