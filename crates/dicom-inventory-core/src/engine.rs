use crate::aggregate::Aggregate;
use crate::classify::{Classifier, PatternTable};
use crate::config::AppConfig;
use crate::decoder::{DicomDecoder, HeaderDecoder};
use crate::error::Error;
use crate::extract::{self, Observation};
use crate::progress::ProgressReporter;
use crate::scanner::{self, FileFilter};
use crate::table::{self, InventoryRow};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct InventoryEngine {
    config: AppConfig,
    classifier: Classifier,
    decoder: Arc<dyn HeaderDecoder>,
}

#[derive(Debug)]
pub struct ScanResult {
    pub rows: Vec<InventoryRow>,
    pub files_found: usize,
    pub files_decoded: usize,
    pub files_skipped: usize,
    pub subjects: usize,
    pub series: usize,
    pub walk_duration: Duration,
    pub decode_duration: Duration,
    pub build_duration: Duration,
}

impl InventoryEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            classifier: Classifier::default(),
            decoder: Arc::new(DicomDecoder),
        }
    }

    pub fn with_patterns(mut self, table: PatternTable) -> Self {
        self.classifier = Classifier::new(table);
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn HeaderDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the inventory pipeline over `root`:
    /// 1. Sorted walk for acquisition files
    /// 2. Parallel header decode + extraction, collected in walk order
    /// 3. Sequential aggregation, subject numbering, row building and
    ///    field-map consolidation
    /// 4. Optional TSV export to `output`
    pub fn scan(
        &self,
        root: &Path,
        output: Option<&Path>,
        reporter: &dyn ProgressReporter,
    ) -> Result<ScanResult, Error> {
        info!("Scanning DICOM headers under: {}", root.display());

        // Phase 1: Walk
        reporter.on_walk_start();
        let walk_start = Instant::now();
        let filter = FileFilter::new(&self.config.file_extension, &self.config.ignore_patterns);
        let files = scanner::collect_acquisition_files(root, &filter);
        let walk_duration = walk_start.elapsed();
        reporter.on_walk_complete(files.len(), walk_duration.as_secs_f64());
        debug!(
            "Walk completed in {:.2}s, {} candidate files",
            walk_duration.as_secs_f64(),
            files.len()
        );

        // Phase 2: Decode
        let decode_start = Instant::now();
        reporter.on_decode_start(files.len());
        let observations = self.extract_all(root, &files, reporter)?;
        let decode_duration = decode_start.elapsed();
        let files_decoded = observations.len();
        let files_skipped = files.len() - files_decoded;
        reporter.on_decode_complete(files_decoded, files_skipped, decode_duration.as_secs_f64());
        if files_skipped > 0 {
            warn!("{} files could not be decoded and were skipped", files_skipped);
        }

        // Phase 3: Aggregate and build
        let build_start = Instant::now();
        let aggregate = Aggregate::from_observations(&observations);
        info!("Subjects found            : {}", aggregate.subject_count());
        info!("Unique Series instances   : {}", aggregate.series_count());
        let rows = table::build_inventory(&aggregate, self.config.fmap_time_bucket);
        let build_duration = build_start.elapsed();
        reporter.on_build_complete(rows.len(), build_duration.as_secs_f64());

        if let Some(path) = output {
            table::write_inventory(path, &rows)?;
        }

        Ok(ScanResult {
            subjects: aggregate.subject_count(),
            series: aggregate.series_count(),
            rows,
            files_found: files.len(),
            files_decoded,
            files_skipped,
            walk_duration,
            decode_duration,
            build_duration,
        })
    }

    /// Decode and extract every file on a bounded pool. The indexed parallel
    /// collect keeps results in `files` order regardless of completion order.
    fn extract_all(
        &self,
        root: &Path,
        files: &[PathBuf],
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<Observation>, Error> {
        let workers = self.config.worker_count();
        debug!("Decoding with {} workers", workers);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

        let done = AtomicUsize::new(0);
        let total = files.len();
        let results: Vec<Option<Observation>> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let observation = match self.decoder.decode(file) {
                        Ok(header) => Some(extract::extract(&header, root, file, &self.classifier)),
                        Err(err) => {
                            warn!("Skipping file: {}", err);
                            None
                        }
                    };
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    reporter.on_decode_progress(finished, total);
                    observation
                })
                .collect()
        });

        Ok(results.into_iter().flatten().collect())
    }
}
