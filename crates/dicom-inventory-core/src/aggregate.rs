use crate::extract::{Demographics, Observation, SeriesKey, SubjectKey};
use std::collections::{BTreeMap, BTreeSet};

/// Per-series accumulator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesStats {
    pub n_files: usize,
    pub modality: String,
    pub acq_time: String,
    pub image_type: String,
}

/// (subject, folder, series) composite key.
pub type SeriesSlot = (SubjectKey, String, SeriesKey);

/// Reduction of all observations of a scan.
///
/// Ordered maps keep iteration sorted by subject, folder, then series key.
#[derive(Debug, Default)]
pub struct Aggregate {
    pub series: BTreeMap<SeriesSlot, SeriesStats>,
    pub sessions: BTreeMap<(SubjectKey, String), BTreeSet<String>>,
    pub demographics: BTreeMap<SubjectKey, Demographics>,
}

impl Aggregate {
    /// Fold observations in the given order. The first observation of a
    /// series or subject decides its recorded attributes.
    pub fn from_observations<'a, I>(observations: I) -> Self
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        let mut aggregate = Aggregate::default();
        for obs in observations {
            aggregate.add(obs);
        }
        aggregate
    }

    pub fn add(&mut self, obs: &Observation) {
        let slot = (obs.subject.clone(), obs.folder.clone(), obs.series.clone());
        let stats = self.series.entry(slot).or_insert_with(|| SeriesStats {
            n_files: 0,
            modality: obs.modality.clone(),
            acq_time: String::new(),
            image_type: obs.image_type.clone(),
        });
        stats.n_files += 1;
        if stats.acq_time.is_empty() && !obs.acq_time.is_empty() {
            stats.acq_time = obs.acq_time.clone();
        }

        let sessions = self
            .sessions
            .entry((obs.subject.clone(), obs.folder.clone()))
            .or_default();
        if let Some(tag) = &obs.session {
            sessions.insert(tag.clone());
        }

        self.demographics
            .entry(obs.subject.clone())
            .or_insert_with(|| obs.demographics.clone());
    }

    /// The folder's session tag when exactly one was detected, empty otherwise.
    pub fn session_label(&self, subject: &SubjectKey, folder: &str) -> String {
        match self.sessions.get(&(subject.clone(), folder.to_string())) {
            Some(tags) if tags.len() == 1 => tags.iter().next().cloned().unwrap_or_default(),
            _ => String::new(),
        }
    }

    pub fn subject_count(&self) -> usize {
        self.demographics.len()
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }
}
