//! JSONL read/write helpers.
//!
//! Ingest writes each aggregated submission to a per-job
//! `ocr_results.jsonl` alongside the database rows, as a plain-text
//! backup and handoff format.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Writes records to a JSONL file, one object per line.
pub fn write_jsonl<T: Serialize>(
    path: &Path,
    records: &[T],
    append: bool,
) -> Result<(), StorageError> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|e| StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;

    for record in records {
        let line = serde_json::to_string(record).map_err(|e| StorageError::JsonRecord {
            path: path.to_path_buf(),
            source: e,
        })?;
        writeln!(file, "{}", line).map_err(|e| StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    Ok(())
}

/// Reads all records from a JSONL file. Blank lines are skipped.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    let file = std::fs::File::open(path).map_err(|e| StorageError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| StorageError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(
            serde_json::from_str(&line).map_err(|e| StorageError::JsonRecord {
                path: path.to_path_buf(),
                source: e,
            })?,
        );
    }

    Ok(records)
}
