pub mod walk;

pub use walk::{collect_acquisition_files, detect_depth, FileFilter};
