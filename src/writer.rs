//! Run writer: encodes one flushed, sorted run into the shared working file.
//!
//! `encode` length-prefixes each record with a varint and writes it through
//! a buffered, compressing sink. `flush_run` drains the buffer, closes out
//! the compression frame, and records the file's current position as the
//! boundary between this run and the next, then reopens a fresh frame on the
//! same file so the next run appends immediately after.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};

use crate::codec::{CodecWriter, Compression};
use crate::entry::Entry;
use crate::error::{Result, SortError};
use crate::varint::{write_uvarint, MAX_VARINT_LEN};

const WRITE_BUF_SIZE: usize = 64 * 1024;

/// Appends length-prefixed, optionally-compressed records to the shared
/// working file, one run at a time.
pub(crate) struct RunWriter {
    inner: Option<BufWriter<CodecWriter<File>>>,
    compression: Compression,
    scratch: [u8; MAX_VARINT_LEN],
    /// End-of-section offsets, one per completed run, in flush order.
    offsets: Vec<u64>,
}

impl RunWriter {
    pub fn new(file: File, compression: Compression) -> Self {
        let codec = CodecWriter::new(compression, file);
        Self {
            inner: Some(BufWriter::with_capacity(WRITE_BUF_SIZE, codec)),
            compression,
            scratch: [0u8; MAX_VARINT_LEN],
            offsets: Vec::new(),
        }
    }

    /// Write one record into the run currently being built.
    ///
    /// Each record is framed as `varint(key_len) ‖ varint(value_len) ‖ key ‖
    /// value` — the key and value lengths are both framed explicitly so the
    /// split survives a disk round-trip and `data_kv()` can still return both
    /// halves after a sort.
    pub fn encode(&mut self, entry: &Entry) -> Result<()> {
        let w = self.inner.as_mut().expect("writer closed");
        let key = entry.key();
        let value = entry.value();
        write_uvarint(w, &mut self.scratch, key.len() as u64)?;
        write_uvarint(w, &mut self.scratch, value.len() as u64)?;
        w.write_all(key)?;
        w.write_all(value)?;
        Ok(())
    }

    /// Compressed bytes committed to the working file across every completed
    /// run so far. Equal to the last recorded offset, or 0 before any run has
    /// been flushed.
    pub fn on_disk_bytes(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Close out the current run: flush the buffer, finalize the compression
    /// frame, and record the file offset it ends at. Reopens a fresh frame on
    /// the same file so the next run can be written immediately.
    ///
    /// Returns `None` if the run was empty (no section recorded) — an empty
    /// flush must not produce a zero-length section indistinguishable from a
    /// real one.
    pub fn flush_run(&mut self, wrote_any: bool) -> Result<Option<u64>> {
        let codec = {
            let w = self.inner.take().expect("writer closed");
            w.into_inner().map_err(|e| e.into_error())?
        };
        let mut file = codec.finish()?;
        file.flush()?;

        if !wrote_any {
            self.inner = Some(BufWriter::with_capacity(
                WRITE_BUF_SIZE,
                CodecWriter::new(self.compression, file),
            ));
            return Ok(None);
        }

        let pos = file.seek(SeekFrom::Current(0))?;
        self.offsets.push(pos);
        self.inner = Some(BufWriter::with_capacity(
            WRITE_BUF_SIZE,
            CodecWriter::new(self.compression, file),
        ));
        Ok(Some(pos))
    }

    /// End-of-section offsets recorded so far, in flush order.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Finalize the writer and hand back the underlying file, positioned
    /// wherever the last flush left it.
    ///
    /// Both steps of the close chain (draining the buffered writer, then
    /// finalizing the compression frame) are attempted even if the first
    /// fails; the later error wins.
    pub fn close(mut self) -> Result<File> {
        let w = self.inner.take().expect("writer closed");
        let (codec, flush_err) = match w.into_inner() {
            Ok(codec) => (codec, None),
            Err(err) => {
                let (io_err, codec) = err.into_parts();
                (codec, Some(SortError::from(io_err)))
            }
        };
        match codec.finish() {
            Ok(file) => match flush_err {
                Some(e) => Err(e),
                None => Ok(file),
            },
            Err(e) => Err(SortError::from(e)),
        }
    }
}
