use super::InventoryRow;
use crate::error::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

pub const COLUMNS: [&str; 19] = [
    "subject",
    "BIDS_name",
    "session",
    "source_folder",
    "include",
    "sequence",
    "series_uid",
    "rep",
    "acq_time",
    "image_type",
    "modality",
    "modality_bids",
    "n_files",
    "GivenName",
    "FamilyName",
    "PatientID",
    "PatientSex",
    "PatientAge",
    "StudyDescription",
];

/// Serialize records as tab-separated text with a header line.
pub fn write_records<W: Write, T: Serialize>(writer: W, records: &[T]) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_records<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<T>, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(reader);
    let mut records = Vec::new();
    for record in rdr.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Write records to `path`, creating parent directories as needed.
pub fn write_records_to<T: Serialize>(path: &Path, records: &[T]) -> Result<(), Error> {
    ensure_parent(path)?;
    write_records(File::create(path)?, records)
}

fn ensure_parent(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_inventory(path: &Path, rows: &[InventoryRow]) -> Result<(), Error> {
    if rows.is_empty() {
        // Serialization only emits a header alongside the first record.
        ensure_parent(path)?;
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;
        wtr.write_record(COLUMNS)?;
        wtr.flush()?;
    } else {
        write_records_to(path, rows)?;
    }
    info!("Inventory written to: {}", path.display());
    Ok(())
}

/// Load an inventory TSV, including one edited by hand after scanning.
pub fn read_inventory(path: &Path) -> Result<Vec<InventoryRow>, Error> {
    read_records(File::open(path)?)
}
