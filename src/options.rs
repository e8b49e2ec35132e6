//! Session configuration and its normalization.
//!
//! `Options` is a plain, `Default`-impl config struct consumed once at
//! construction and never mutated afterwards; `normalize()` resolves it into
//! a private, fully-formed configuration the rest of the crate works with,
//! clamping the buffer size to a floor and filling in the default comparator.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::rc::Rc;

use crate::codec::Compression;

/// Total order on keys. Defaults to lexicographic byte comparison.
pub type Compare = Rc<dyn Fn(&[u8], &[u8]) -> Ordering>;

/// Equality predicate on keys, used to suppress adjacent duplicates.
pub type Dedupe = Rc<dyn Fn(&[u8], &[u8]) -> bool>;

/// Minimum buffer size: requests below this are silently clamped.
pub const MIN_BUFFER_SIZE: usize = 64 * 1024;

/// Default buffer size: 64 MiB.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Caller-supplied configuration for a [`crate::Sorter`].
///
/// Read-only input: the constructor normalizes a copy into a private
/// configuration record, so mutating the original `Options` value after
/// `Sorter::new` has no effect.
#[derive(Clone)]
pub struct Options {
    pub work_dir: Option<PathBuf>,
    pub compare: Option<Compare>,
    pub dedupe: Option<Dedupe>,
    pub buffer_size: usize,
    pub compression: Compression,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("work_dir", &self.work_dir)
            .field("compare", &self.compare.as_ref().map(|_| "<fn>"))
            .field("dedupe", &self.dedupe.as_ref().map(|_| "<fn>"))
            .field("buffer_size", &self.buffer_size)
            .field("compression", &self.compression)
            .finish()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            work_dir: None,
            compare: None,
            dedupe: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            compression: Compression::None,
        }
    }
}

/// Lexicographic byte comparison — the default `compare`.
fn std_compare(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Fully-resolved, immutable configuration used internally once a
/// [`crate::Sorter`] has been constructed.
#[derive(Clone)]
pub(crate) struct NormalizedOptions {
    pub work_dir: Option<PathBuf>,
    pub compare: Compare,
    pub dedupe: Option<Dedupe>,
    pub buffer_size: usize,
    pub compression: Compression,
}

impl Options {
    /// Normalize into a private, fully-resolved configuration. Pure — no I/O.
    pub(crate) fn normalize(&self) -> NormalizedOptions {
        let compare = self
            .compare
            .clone()
            .unwrap_or_else(|| Rc::new(std_compare) as Compare);

        let buffer_size = if self.buffer_size < MIN_BUFFER_SIZE {
            if self.buffer_size != 0 {
                log::warn!(
                    "buffer_size {} below the {} byte floor; clamping",
                    self.buffer_size,
                    MIN_BUFFER_SIZE
                );
            }
            if self.buffer_size == 0 {
                DEFAULT_BUFFER_SIZE
            } else {
                MIN_BUFFER_SIZE
            }
        } else {
            self.buffer_size
        };

        NormalizedOptions {
            work_dir: self.work_dir.clone(),
            compare,
            dedupe: self.dedupe.clone(),
            buffer_size,
            compression: self.compression,
        }
    }
}
