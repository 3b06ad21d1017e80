//! Error Types for LabelPack
//!
//! This module defines all error types that can occur while writing, indexing
//! and streaming LabelPack containers.
//!
//! ## Error Categories
//!
//! ### I/O Errors
//! - `Io`: file system operations (including `AlreadyExists` when a writer
//!   targets a path that is already taken)
//!
//! ### Payload Errors
//! - `BadFile`: a payload source could not be sized or fully read while
//!   encoding a record. The caller may skip that record and carry on.
//! - `FieldTooLarge`: an in-memory field does not fit the 32-bit size slot
//!
//! ### Data Integrity Errors
//! - `DataCorruption`: a record's field layout does not fit the bytes read
//!   from disk
//! - `MalformedFile`: the segment chain is broken (link mismatch, header past
//!   end of file, record count over capacity)
//! - `Misaligned`: the writer found itself at an offset that is not a multiple
//!   of the record alignment
//!
//! `MalformedFile` and `Misaligned` mean the file (or the filesystem under it)
//! cannot be trusted. They are never retried.
//!
//! ### Configuration Errors
//! - `InvalidConfig`: fold keys out of range, bad k-fold parameters, zero
//!   usable records, unparsable config files
//! - `BadLabel`: a label that cannot be used as a stratification category
//!
//! ## End of Stream
//!
//! Running out of records is not an error. Samplers and streams return
//! `None` when every group has been retired.
//!
//! ## Usage
//! ```ignore
//! use labelpack_core::{Error, Result, RecordView};
//!
//! fn load(buf: bytes::Bytes) -> Result<f32> {
//!     let view = RecordView::decode(buf)?;
//!     Ok(view.label())
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad payload file {}: {reason}", .path.display())]
    BadFile { path: PathBuf, reason: String },

    #[error("Field {index} is {len} bytes, larger than a u32 size slot")]
    FieldTooLarge { index: usize, len: u64 },

    #[error("Data corruption: {0}")]
    DataCorruption(String),

    #[error("Malformed file at offset {offset}: {reason}")]
    MalformedFile { offset: u64, reason: String },

    #[error("Misaligned offset {offset} (alignment {align})")]
    Misaligned { offset: u64, align: u64 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Bad label {label}: {reason}")]
    BadLabel { label: f32, reason: String },
}

impl Error {
    pub fn bad_file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::BadFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        Self::MalformedFile {
            offset,
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// True for errors that invalidate the whole file rather than one record.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::MalformedFile { .. } | Error::Misaligned { .. } | Error::DataCorruption(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
