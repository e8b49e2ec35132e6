//! Section-bounded reading of the shared working file during merge.
//!
//! Each run ("section") gets a byte-range view clamped to its own span of
//! the file, wrapped in a decompressor, wrapped in a buffered reader sized
//! `buffer_size / (sections + 1)` so the total read-ahead buffering stays
//! within the configured memory budget regardless of fan-in. The byte-range
//! view reads by position (`FileExt::read_at` on unix, `FileExt::seek_read`
//! on windows) rather than `Seek` + `Read`, so many sections can share one
//! underlying file without stepping on each other's cursor.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::rc::Rc;

use crate::codec::{CodecReader, Compression};
use crate::entry::{Entry, EntryPool};
use crate::error::Result;
use crate::varint::read_uvarint;

#[cfg(unix)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

/// A read-only view over one contiguous byte range of a shared file,
/// addressed by position rather than by the file's own cursor.
struct SectionView {
    file: Rc<File>,
    pos: u64,
    end: u64,
}

impl Read for SectionView {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.end.saturating_sub(self.pos);
        if remaining == 0 {
            return Ok(0);
        }
        let cap = remaining.min(buf.len() as u64) as usize;
        let n = pread(&self.file, &mut buf[..cap], self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

/// One run's decoding pipeline: bounded byte range -> decompressor ->
/// buffered reader, or `None` once the run is exhausted. Sections retire
/// independently of one another.
struct Section {
    reader: Option<BufReader<CodecReader<SectionView>>>,
}

/// Reads length-prefixed records back out of every run in the shared working
/// file, one run ("section") at a time, independent of the others.
pub(crate) struct SectionedReader {
    sections: Vec<Section>,
}

impl SectionedReader {
    /// `offsets` are cumulative end-of-section positions, in the order the
    /// runs were flushed; the working file must be positioned at (or
    /// re-openable from) offset 0.
    pub fn new(
        file: File,
        offsets: &[u64],
        buffer_size: usize,
        compression: Compression,
    ) -> Result<Self> {
        let file = Rc::new(file);
        let slimit = (buffer_size / (offsets.len() + 1)).max(4 * 1024);

        let mut sections = Vec::with_capacity(offsets.len());
        let mut start = 0u64;
        for &end in offsets {
            let view = SectionView {
                file: Rc::clone(&file),
                pos: start,
                end,
            };
            let codec = CodecReader::new(compression, view);
            sections.push(Section {
                reader: Some(BufReader::with_capacity(slimit, codec)),
            });
            start = end;
        }

        Ok(Self { sections })
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Read the next record from `section`, or `Ok(None)` once that run is
    /// exhausted. Calling this again on an exhausted section is a no-op.
    ///
    /// Reads back `varint(key_len) ‖ varint(value_len) ‖ key ‖ value`, the
    /// framing `RunWriter::encode` wrote (see `writer.rs`).
    pub fn read_next(&mut self, section: usize, pool: &mut EntryPool) -> Result<Option<Entry>> {
        let slot = &mut self.sections[section];
        let Some(reader) = slot.reader.as_mut() else {
            return Ok(None);
        };

        let Some(key_len) = read_uvarint(reader)? else {
            slot.reader = None;
            return Ok(None);
        };
        let value_len = read_uvarint(reader)?
            .ok_or_else(|| crate::error::SortError::codec("truncated record: missing value length"))?;

        let mut buf = vec![0u8; (key_len + value_len) as usize];
        reader.read_exact(&mut buf)?;
        let entry = pool.fetch(&buf[..key_len as usize], &buf[key_len as usize..]);
        log::trace!("section {} read record ({} key bytes, {} value bytes)", section, key_len, value_len);
        Ok(Some(entry))
    }

    /// Finalize every still-open section's decompressor and release the
    /// shared file handle.
    ///
    /// Draining each open section to its end runs the decompressor's own
    /// integrity checks (a truncated gzip member or a corrupt snappy frame
    /// surfaces here as an error) even if the merge stopped reading that
    /// section early. Every section is drained regardless of an earlier
    /// failure; the last error wins, matching `RunWriter::close`.
    pub fn close(mut self) -> Result<()> {
        let mut last_err: Option<crate::error::SortError> = None;
        for section in self.sections.iter_mut() {
            if let Some(mut reader) = section.reader.take() {
                if let Err(e) = io::copy(&mut reader, &mut io::sink()) {
                    last_err = Some(crate::error::SortError::from(e));
                }
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
