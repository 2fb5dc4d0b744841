use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dicom-inventory")]
#[command(about = "Inventory of the DICOM series under a raw data folder", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a DICOM folder and build the series inventory
    Scan {
        /// Folder with raw DICOM files organised in sub-folders
        dicom_root: PathBuf,
        /// Destination TSV; a preview is printed when omitted
        output_tsv: Option<PathBuf>,
        /// Number of decode workers (defaults to half the cores)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Classification pattern file to use instead of the configured one
        #[arg(long)]
        patterns: Option<PathBuf>,
    },
    /// Write participants.tsv and subject_mapping.tsv from an inventory,
    /// one folder per study unless --study is given
    Participants {
        inventory_tsv: PathBuf,
        out_dir: PathBuf,
        /// Only this StudyDescription, written directly into out_dir
        #[arg(long)]
        study: Option<String>,
    },
    /// Write the source folder to subject code map for included rows
    SubjectMap {
        inventory_tsv: PathBuf,
        output_tsv: PathBuf,
    },
    /// Print the directory depth of the first DICOM files under a folder
    Depth { folder: PathBuf },
    /// Print the active classification patterns
    PrintPatterns,
    /// Write the active classification patterns to the pattern file for editing
    ExportPatterns,
    /// Delete the pattern file and go back to the built-in patterns
    ResetPatterns,
    /// Print configuration values
    PrintConfig,
}
