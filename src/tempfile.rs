//! Scratch-file allocation for the shared working file.
//!
//! Create the file, then immediately unlink its directory entry where the
//! platform supports it, so a crash mid-sort leaves nothing behind; on
//! platforms without unlink-while-open semantics the name is cleaned up on
//! close instead. The `tempfile` crate's `NamedTempFile` already implements
//! both halves of that split, so this module is a thin, documented wrapper
//! around it rather than a reimplementation.

use std::fs::File;
use std::io;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

/// Prefix every working file is named with.
const WORK_FILE_PREFIX: &str = "extsort";

/// Allocate the single working file backing a [`crate::Sorter`] session.
///
/// On unix-like platforms the returned file's directory entry is already
/// gone by the time this returns — a best-effort tidiness property, not a
/// guarantee across every platform.
pub(crate) fn create_work_file(dir: Option<&Path>) -> io::Result<File> {
    let named = match dir {
        Some(dir) => Builder::new()
            .prefix(WORK_FILE_PREFIX)
            .rand_bytes(12)
            .tempfile_in(dir)?,
        None => Builder::new()
            .prefix(WORK_FILE_PREFIX)
            .rand_bytes(12)
            .tempfile()?,
    };
    named.into_file_and_path_result_like()
}

trait IntoFileAndUnlink {
    fn into_file_and_path_result_like(self) -> io::Result<File>;
}

impl IntoFileAndUnlink for NamedTempFile {
    fn into_file_and_path_result_like(self) -> io::Result<File> {
        // `into_parts` separates the open `File` from its path and its
        // `TempPath` guard; dropping the guard here removes the directory
        // entry immediately (unix) or marks it for removal (elsewhere),
        // matching `newTempFile`'s unlink-up-front behavior.
        let (file, temp_path) = self.into_parts();
        temp_path.close()?;
        Ok(file)
    }
}
