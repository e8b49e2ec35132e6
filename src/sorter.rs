//! The public sorting session and its output iterator.
//!
//! `flush` lazily opens the working file on first use, sorts and optionally
//! dedupes the buffer, and encodes it as one run; `sort` does a final flush
//! and hands back an iterator primed with one heap entry per run (the
//! priming loop at the bottom of `Sorter::sort` below fills every section
//! once up front).
//!
//! Flush-time dedupe does **not** reuse the merge iterator's forward
//! skip-adjacent-duplicate scan, because the two orderings disagree on which
//! occurrence survives (see `buffer.rs`): the buffer sort breaks ties
//! ascending by insertion order, so the run of duplicates ends with the most
//! recently appended one, and keeping it requires a one-entry lookahead
//! rather than a simple "skip if equal to the last emitted" scan.

use std::collections::BinaryHeap;
use std::rc::Rc;

use crate::buffer::{HeapItem, RunBuffer};
use crate::entry::{Entry, EntryPool};
use crate::error::{Result, SortError};
use crate::options::{Compare, Dedupe, NormalizedOptions, Options};
use crate::reader::SectionedReader;
use crate::tempfile::create_work_file;
use crate::writer::RunWriter;

/// A sorting session: buffers appended records in memory, spilling sorted
/// runs to a single working file once the buffer is full, until [`sort`]
/// streams the fully-merged result back out.
///
/// [`sort`]: Sorter::sort
pub struct Sorter {
    options: NormalizedOptions,
    buffer: RunBuffer,
    writer: Option<RunWriter>,
    pool: EntryPool,
}

impl Sorter {
    pub fn new(options: Options) -> Self {
        let normalized = options.normalize();
        log::debug!(
            "new sort session: buffer_size={} compression={}",
            normalized.buffer_size,
            normalized.compression.name()
        );
        let buffer = RunBuffer::new(Rc::clone(&normalized.compare));
        Self {
            options: normalized,
            buffer,
            writer: None,
            pool: EntryPool::new(),
        }
    }

    /// Append a record treating its entirety as the key, with an empty
    /// value ("blob mode").
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        self.put(data, b"")
    }

    /// Append a key/value record ("KV mode").
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let incoming = key.len() + value.len();
        if self.buffer.byte_size() > 0
            && self.buffer.byte_size() + incoming > self.options.buffer_size
        {
            log::debug!(
                "buffer at {} bytes would exceed {} byte budget; flushing a run",
                self.buffer.byte_size(),
                self.options.buffer_size
            );
            self.flush()?;
        }
        let entry = self.pool.fetch(key, value);
        self.buffer.push(entry);
        Ok(())
    }

    /// Approximate total bytes currently held by the session: the
    /// not-yet-flushed buffer (uncompressed) plus every compressed byte
    /// already spilled to the working file.
    pub fn size(&self) -> u64 {
        let on_disk = self.writer.as_ref().map(|w| w.on_disk_bytes()).unwrap_or(0);
        self.buffer.byte_size() as u64 + on_disk
    }

    /// Sort the buffered and spilled records and return a streaming,
    /// k-way-merged iterator over the result.
    pub fn sort(mut self) -> Result<SortIterator> {
        self.flush()?;

        let writer = self.writer.take().expect("flush always opens a writer");
        let offsets = writer.offsets().to_vec();
        let file = writer.close()?;

        let mut reader = SectionedReader::new(file, &offsets, self.options.buffer_size, self.options.compression)?;

        let mut heap = BinaryHeap::new();
        for section in 0..reader.num_sections() {
            if let Some(entry) = reader.read_next(section, &mut self.pool)? {
                heap.push(HeapItem::new(section, entry, Rc::clone(&self.options.compare)));
            }
        }

        Ok(SortIterator {
            reader,
            heap,
            compare: self.options.compare,
            dedupe: self.options.dedupe,
            pool: self.pool,
            current: None,
            last_emitted_key: None,
            err: None,
        })
    }

    /// Discard the session before sorting, releasing the working file if one
    /// was ever opened.
    pub fn close(mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.close()?;
        }
        Ok(())
    }

    /// Open the working file (if this is the first flush), sort and
    /// optionally dedupe the buffer, and encode it as one run.
    fn flush(&mut self) -> Result<()> {
        if self.writer.is_none() {
            let file = create_work_file(self.options.work_dir.as_deref())?;
            self.writer = Some(RunWriter::new(file, self.options.compression));
        }
        let writer = self.writer.as_mut().expect("writer just opened");

        self.buffer.sort();
        let entries = self.buffer.drain();
        let wrote_any = !entries.is_empty();
        let mut emitted = 0u64;

        match &self.options.dedupe {
            None => {
                for entry in entries {
                    writer.encode(&entry)?;
                    emitted += 1;
                    self.pool.release(entry);
                }
            }
            Some(dedupe) => {
                // One-entry lookahead: `pending` always holds the
                // most-recently-seen record of the current key group, so by
                // the time the group ends (or the run ends) it holds the
                // last occurrence under the buffer's insertion-order
                // tie-break.
                let mut pending: Option<Entry> = None;
                for entry in entries {
                    let duplicate = pending
                        .as_ref()
                        .map(|p| dedupe(p.key(), entry.key()))
                        .unwrap_or(false);

                    if duplicate {
                        let old = pending.replace(entry).expect("checked above");
                        self.pool.release(old);
                    } else {
                        if let Some(p) = pending.replace(entry) {
                            writer.encode(&p)?;
                            emitted += 1;
                            self.pool.release(p);
                        }
                    }
                }
                if let Some(p) = pending.take() {
                    writer.encode(&p)?;
                    emitted += 1;
                    self.pool.release(p);
                }
            }
        }

        if let Some(end) = writer.flush_run(wrote_any)? {
            log::debug!(
                "flushed run {} ({} records, {} bytes on disk)",
                writer.offsets().len() - 1,
                emitted,
                end
            );
        }
        Ok(())
    }
}

/// Streams sorted records back out via a k-way merge over every spilled run.
pub struct SortIterator {
    reader: SectionedReader,
    heap: BinaryHeap<HeapItem>,
    compare: Compare,
    dedupe: Option<Dedupe>,
    pool: EntryPool,
    current: Option<Entry>,
    last_emitted_key: Option<Vec<u8>>,
    err: Option<SortError>,
}

impl SortIterator {
    /// Advance to the next record. Returns `false` once the merge is
    /// exhausted or an error occurred — check [`err`] to distinguish the two.
    ///
    /// [`err`]: SortIterator::err
    pub fn next(&mut self) -> bool {
        if self.err.is_some() {
            return false;
        }

        loop {
            let Some(item) = self.heap.pop() else {
                if let Some(prev) = self.current.take() {
                    self.pool.release(prev);
                }
                return false;
            };
            let entry = item.entry;
            let section = item.section;
            log::trace!("popped section {} from the merge heap", section);

            match self.reader.read_next(section, &mut self.pool) {
                Ok(Some(next_entry)) => {
                    self.heap
                        .push(HeapItem::new(section, next_entry, Rc::clone(&self.compare)));
                }
                Ok(None) => {}
                Err(e) => {
                    self.pool.release(entry);
                    if let Some(prev) = self.current.take() {
                        self.pool.release(prev);
                    }
                    self.err = Some(e);
                    return false;
                }
            }

            let suppress = match (&self.dedupe, &self.last_emitted_key) {
                (Some(dedupe), Some(last_key)) => dedupe(entry.key(), last_key),
                _ => false,
            };

            if suppress {
                self.pool.release(entry);
                continue;
            }

            if self.dedupe.is_some() {
                self.last_emitted_key = Some(entry.key().to_vec());
            }
            if let Some(prev) = self.current.take() {
                self.pool.release(prev);
            }
            self.current = Some(entry);
            return true;
        }
    }

    /// The current record's key (or whole blob, in blob mode).
    pub fn key(&self) -> &[u8] {
        self.current.as_ref().map(|e| e.key()).unwrap_or(&[])
    }

    /// The current record's value (empty in blob mode).
    pub fn value(&self) -> &[u8] {
        self.current.as_ref().map(|e| e.value()).unwrap_or(&[])
    }

    /// The current record's key, for parity with `Sorter::append`'s blob
    /// mode.
    pub fn data(&self) -> &[u8] {
        self.key()
    }

    /// The current record's key and value together.
    pub fn data_kv(&self) -> (&[u8], &[u8]) {
        (self.key(), self.value())
    }

    /// The error that stopped iteration, if any.
    pub fn err(&self) -> Option<&SortError> {
        self.err.as_ref()
    }

    /// Finalize every section's decompressor and release the working file.
    ///
    /// Unlike dropping the iterator, this surfaces any error a section's
    /// decompressor raises while finalizing (see `SectionedReader::close`).
    pub fn close(mut self) -> Result<()> {
        if let Some(entry) = self.current.take() {
            self.pool.release(entry);
        }
        self.reader.close()
    }
}
