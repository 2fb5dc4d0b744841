mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dicom_inventory_core::scanner::{self, FileFilter};
use dicom_inventory_core::table::read_inventory;
use dicom_inventory_core::{participants, AppConfig, InventoryEngine, InventoryRow, PatternStore};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info};

const PREVIEW_ROWS: usize = 10;

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match dicom_inventory_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let outcome = match args.command {
        Some(Commands::Scan {
            dicom_root,
            output_tsv,
            jobs,
            patterns,
        }) => run_scan(config, &dicom_root, output_tsv.as_deref(), jobs, patterns),
        Some(Commands::Participants {
            inventory_tsv,
            out_dir,
            study,
        }) => run_participants(&inventory_tsv, &out_dir, study.as_deref()),
        Some(Commands::SubjectMap {
            inventory_tsv,
            output_tsv,
        }) => run_subject_map(&inventory_tsv, &output_tsv),
        Some(Commands::Depth { folder }) => run_depth(&config, &folder),
        Some(Commands::PrintPatterns) => print_patterns(&config),
        Some(Commands::ExportPatterns) => export_patterns(&config),
        Some(Commands::ResetPatterns) => reset_patterns(&config),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run_scan(
    mut config: AppConfig,
    dicom_root: &Path,
    output_tsv: Option<&Path>,
    jobs: Option<usize>,
    patterns: Option<PathBuf>,
) -> anyhow::Result<()> {
    if jobs.is_some() {
        config.jobs = jobs;
    }
    let store = PatternStore::new(patterns.unwrap_or_else(|| PathBuf::from(&config.patterns_path)));
    let table = store
        .load_override()
        .with_context(|| format!("loading patterns from {}", store.path().display()))?;

    let engine = InventoryEngine::new(config).with_patterns(table);
    let reporter = CliReporter::new();
    let result = engine.scan(dicom_root, output_tsv, &reporter)?;

    println!();
    info!(
        "Walk: {}, Decode: {}, Build: {}",
        format!("{:.2}s", result.walk_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.decode_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.build_duration.as_secs_f64()).green(),
    );
    info!(
        "{} subjects, {} series, {} rows, {} files skipped",
        format!("{}", result.subjects).cyan(),
        format!("{}", result.series).cyan(),
        format!("{}", result.rows.len()).cyan(),
        format!("{}", result.files_skipped).red(),
    );

    print_preview(&result.rows);
    Ok(())
}

fn print_preview(rows: &[InventoryRow]) {
    println!("\nPreview (first {} rows):\n", PREVIEW_ROWS.min(rows.len()));
    println!(
        "{:<10} {:<10} {:<24} {:<3} {:<32} {:<4} {:<8} {:>7}",
        "BIDS_name", "session", "source_folder", "inc", "sequence", "rep", "modality", "n_files"
    );
    for row in rows.iter().take(PREVIEW_ROWS) {
        let include = if row.include == 1 {
            "1".green()
        } else {
            "0".red()
        };
        println!(
            "{:<10} {:<10} {:<24} {:<3} {:<32} {:<4} {:<8} {:>7}",
            row.bids_name,
            row.session,
            row.source_folder,
            include,
            row.sequence,
            row.rep.map(|r| r.to_string()).unwrap_or_default(),
            row.modality,
            row.n_files,
        );
    }
}

fn run_participants(
    inventory_tsv: &Path,
    out_dir: &Path,
    study: Option<&str>,
) -> anyhow::Result<()> {
    let rows = read_inventory(inventory_tsv)
        .with_context(|| format!("reading {}", inventory_tsv.display()))?;

    if let Some(study) = study {
        let count = participants::write_participants(&rows, study, out_dir)?;
        if count == 0 {
            anyhow::bail!("no rows for study '{}' in {}", study, inventory_tsv.display());
        }
        info!("{} participants", format!("{}", count).cyan());
        return Ok(());
    }

    for (dir, count) in participants::write_participants_by_study(&rows, out_dir)? {
        info!(
            "{} participants in {}",
            format!("{}", count).cyan(),
            dir.display()
        );
    }
    Ok(())
}

fn run_subject_map(inventory_tsv: &Path, output_tsv: &Path) -> anyhow::Result<()> {
    let rows = read_inventory(inventory_tsv)
        .with_context(|| format!("reading {}", inventory_tsv.display()))?;
    participants::write_subject_id_map(&rows, output_tsv)?;
    Ok(())
}

fn run_depth(config: &AppConfig, folder: &Path) -> anyhow::Result<()> {
    let filter = FileFilter::new(&config.file_extension, &config.ignore_patterns);
    let depth = scanner::detect_depth(folder, &filter)?;
    println!("{}", depth);
    Ok(())
}

fn print_patterns(config: &AppConfig) -> anyhow::Result<()> {
    let table = PatternStore::new(&config.patterns_path).load_override()?;
    for entry in &table.entries {
        println!("{:<10} {}", entry.label.bold(), entry.patterns.join(", "));
    }
    Ok(())
}

fn export_patterns(config: &AppConfig) -> anyhow::Result<()> {
    let store = PatternStore::new(&config.patterns_path);
    let table = store.load_override()?;
    store.save(&table)?;
    println!("Patterns written to {}", store.path().display());
    Ok(())
}

fn reset_patterns(config: &AppConfig) -> anyhow::Result<()> {
    let store = PatternStore::new(&config.patterns_path);
    if !store.path().exists() {
        println!("No pattern override at {}", store.path().display());
        return Ok(());
    }
    if prompt_confirm(
        &format!("Delete {} and restore the built-in patterns?", store.path().display()),
        Some(false),
    )? {
        store.restore_default()?;
        println!("Built-in patterns restored");
    }
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
