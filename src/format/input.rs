//! Key/value text input.
//!
//! Every line is a record. The key runs up to the first separator byte and
//! the value is the remainder of the line. A line without a separator is all
//! key with an empty value.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use glob::glob;
use tracing::debug;

use crate::error::HistogramError;
use crate::histogram::InputRecord;
use crate::KeyValue;

/// Files inside an input directory starting with one of these are skipped
/// (`_SUCCESS` markers, editor swap files and the like).
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.starts_with('_') || name.starts_with('.'))
}

/// Resolves an input location to the files to read.
///
/// `location` may name a file, a directory (its visible regular files are
/// used, in name order) or a glob pattern (hidden matches are dropped too).
pub fn list_input_files(location: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(location);
    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else if path.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(path)
            .with_context(|| format!("Failed to list input directory {}", path.display()))?
        {
            let entry_path = entry?.path();
            if entry_path.is_file() && !is_hidden(&entry_path) {
                files.push(entry_path);
            }
        }
        files.sort();
        files
    } else {
        let pattern = glob(location)
            .with_context(|| format!("Invalid input pattern '{}'", location))?;
        let mut files = Vec::new();
        for entry in pattern {
            let entry_path =
                entry.with_context(|| format!("Failed to expand input pattern '{}'", location))?;
            if entry_path.is_file() && !is_hidden(&entry_path) {
                files.push(entry_path);
            }
        }
        files
    };

    if files.is_empty() {
        return Err(HistogramError::NoInput(location.to_string()).into());
    }
    debug!(location, files = files.len(), "resolved input files");
    Ok(files)
}

/// Reads one input file into records.
pub fn read_records(path: &Path, separator: u8) -> Result<Vec<InputRecord>> {
    let buf = fs::read(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    let origin: Arc<str> = Arc::from(path.display().to_string());
    Ok(split_records(origin, Bytes::from(buf), separator))
}

/// Splits a buffer into records without copying: keys and values are
/// slices of `buf`.
pub fn split_records(origin: Arc<str>, buf: Bytes, separator: u8) -> Vec<InputRecord> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut line_no = 0u64;

    while start < buf.len() {
        let newline = buf[start..].iter().position(|&b| b == b'\n');
        let next = newline.map_or(buf.len(), |n| start + n + 1);
        let mut end = newline.map_or(buf.len(), |n| start + n);
        if end > start && buf[end - 1] == b'\r' {
            end -= 1;
        }
        line_no += 1;

        let kv = match buf[start..end].iter().position(|&b| b == separator) {
            Some(at) => KeyValue::new(buf.slice(start..start + at), buf.slice(start + at + 1..end)),
            None => KeyValue::new(buf.slice(start..end), Bytes::new()),
        };
        records.push(InputRecord::new(origin.clone(), line_no, kv));
        start = next;
    }

    records
}
