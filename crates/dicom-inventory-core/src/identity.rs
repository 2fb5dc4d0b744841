use crate::extract::SubjectKey;
use std::collections::{BTreeMap, BTreeSet};

/// Assign `sub-001`, `sub-002`, ... to subjects, numbered independently per
/// study in lexicographic order of the raw identifier.
///
/// Adding a subject shifts the codes of subjects sorting after it.
pub fn assign_subject_codes<'a, I>(subjects: I) -> BTreeMap<SubjectKey, String>
where
    I: IntoIterator<Item = &'a SubjectKey>,
{
    let mut by_study: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for key in subjects {
        by_study
            .entry(key.study.as_str())
            .or_default()
            .insert(key.subject.as_str());
    }

    let mut codes = BTreeMap::new();
    for (study, ids) in by_study {
        for (i, id) in ids.into_iter().enumerate() {
            codes.insert(
                SubjectKey {
                    subject: id.to_string(),
                    study: study.to_string(),
                },
                format!("sub-{:03}", i + 1),
            );
        }
    }
    codes
}
