//! Error types for the sort pipeline.
//!
//! I/O failures propagate unchanged, while codec-level problems (truncated
//! records, varint overflow, decompression failures) get their own variant
//! because the underlying compressor errors (`flate2`/`snap`) are not
//! uniform types.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SortError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("codec error: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, SortError>;

impl SortError {
    pub(crate) fn codec(msg: impl Into<String>) -> Self {
        SortError::Codec(msg.into())
    }
}
