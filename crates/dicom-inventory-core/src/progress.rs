/// Trait for reporting inventory progress.
///
/// The CLI implements it with indicatif bars. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_walk_start(&self) {}
    fn on_walk_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_decode_start(&self, _total_files: usize) {}
    /// Called from worker threads; implementations must tolerate concurrent calls.
    fn on_decode_progress(&self, _files_decoded: usize, _total_files: usize) {}
    fn on_decode_complete(&self, _decoded: usize, _skipped: usize, _duration_secs: f64) {}
    fn on_build_complete(&self, _rows: usize, _duration_secs: f64) {}
}

/// Discards every progress event. Used by tests and library callers.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
