//! CSV encoding of a snapshot record into local scratch storage.
//!
//! One header row plus one data row, columns in [`SnapshotRecord::FIELDS`]
//! order. File names are `{label}_{YYYYMMDDHHMMSS}.csv` in local wall-clock
//! time, so two encodes within the same second produce the same name.

use crate::snapshot::SnapshotRecord;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to prepare scratch dir {path}: {source}")]
    ScratchDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// A written file awaiting upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    /// Full local path.
    pub path: PathBuf,
    /// Bare file name, used to build the object key.
    pub file_name: String,
}

/// `{label}_{YYYYMMDDHHMMSS}.csv`
pub fn file_name(label: &str, at: NaiveDateTime) -> String {
    format!("{label}_{}.csv", at.format("%Y%m%d%H%M%S"))
}

/// Encode `record` into `scratch_dir`, naming the file with the current local time.
pub fn encode(
    record: &SnapshotRecord,
    scratch_dir: &Path,
    label: &str,
) -> Result<EncodedFile, EncodeError> {
    encode_at(record, scratch_dir, label, chrono::Local::now().naive_local())
}

/// Encode `record` into `scratch_dir`, naming the file for `encoded_at`.
///
/// An existing file of the same name is overwritten.
pub fn encode_at(
    record: &SnapshotRecord,
    scratch_dir: &Path,
    label: &str,
    encoded_at: NaiveDateTime,
) -> Result<EncodedFile, EncodeError> {
    std::fs::create_dir_all(scratch_dir).map_err(|source| EncodeError::ScratchDir {
        path: scratch_dir.to_path_buf(),
        source,
    })?;

    let file_name = file_name(label, encoded_at);
    let path = scratch_dir.join(&file_name);
    let write_err = |source| EncodeError::Write {
        path: path.clone(),
        source,
    };

    let mut wtr = csv::Writer::from_path(&path).map_err(write_err)?;
    wtr.serialize(record).map_err(write_err)?;
    wtr.flush().map_err(|e| write_err(csv::Error::from(e)))?;

    Ok(EncodedFile { path, file_name })
}
