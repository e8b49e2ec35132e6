//! # extsort — external merge-sort engine
//!
//! Sorting guarantees:
//! - Records larger than memory are handled by spilling sorted runs to a
//!   single working file and streaming the result back through a k-way merge
//! - `sort()` is a total order: ties on key are broken by insertion order,
//!   never left to chance, regardless of whether the underlying sort is
//!   stable
//! - The working file is a single handle shared by every run; sections are
//!   addressed by byte range, not by separate files
//! - A configured `dedupe` predicate always keeps the most recently appended
//!   record among equal keys, whether the duplicates land in the same run or
//!   are split across several
//! - Compression is opt-in and pluggable; unknown on-disk compression tags
//!   coerce to "none" rather than failing a read

pub mod buffer;
pub mod codec;
pub mod entry;
pub mod error;
pub mod options;
pub mod reader;
pub mod sorter;
pub mod tempfile;
pub mod varint;
pub mod writer;

pub use codec::Compression;
pub use error::SortError;
pub use options::{Compare, Dedupe, Options};
pub use sorter::{SortIterator, Sorter};
