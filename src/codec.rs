//! Pluggable streaming compression codec.
//!
//! A run is built up across many `encode()` calls before it is finalized, so
//! compression here is a `Write`/`Read` chain rather than a single
//! whole-buffer `compress`/`decompress` call: wrap the sink in a compressor,
//! write to it incrementally, then finalize the frame once the run is done.
//! Starting a new run reopens a fresh frame around the same sink rather than
//! resetting one in place, since neither `flate2` nor `snap` expose an
//! in-place reset for their writers — the effect on the byte stream is the
//! same either way.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;

/// Recognized compression identifiers. Closed by construction: there is no
/// way to hold a `Compression` value outside this set, so the "unknown codec
/// degrades to none" rule from the wire format is enforced by the type
/// system rather than at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Snappy,
}

impl Compression {
    pub fn name(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Snappy => "snappy",
        }
    }
}

/// A streaming compressing sink chained in front of a run file.
pub enum CodecWriter<W: Write> {
    None(W),
    Gzip(GzEncoder<W>),
    Snappy(snap::write::FrameEncoder<W>),
}

impl<W: Write> CodecWriter<W> {
    pub fn new(compression: Compression, inner: W) -> Self {
        match compression {
            Compression::None => CodecWriter::None(inner),
            Compression::Gzip => CodecWriter::Gzip(GzEncoder::new(inner, GzLevel::fast())),
            Compression::Snappy => CodecWriter::Snappy(snap::write::FrameEncoder::new(inner)),
        }
    }

    /// Finalize the current frame and hand back the inner sink, so a fresh
    /// frame can be wrapped around it for the next run.
    pub fn finish(self) -> io::Result<W> {
        match self {
            CodecWriter::None(w) => Ok(w),
            CodecWriter::Gzip(enc) => enc.finish(),
            CodecWriter::Snappy(enc) => enc.into_inner().map_err(|e| e.into_error()),
        }
    }
}

impl<W: Write> Write for CodecWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            CodecWriter::None(w) => w.write(buf),
            CodecWriter::Gzip(enc) => enc.write(buf),
            CodecWriter::Snappy(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            CodecWriter::None(w) => w.flush(),
            CodecWriter::Gzip(enc) => enc.flush(),
            CodecWriter::Snappy(enc) => enc.flush(),
        }
    }
}

/// A streaming decompressing source reading one run's byte range.
pub enum CodecReader<R: Read> {
    None(R),
    Gzip(GzDecoder<R>),
    Snappy(snap::read::FrameDecoder<R>),
}

impl<R: Read> CodecReader<R> {
    pub fn new(compression: Compression, inner: R) -> Self {
        match compression {
            Compression::None => CodecReader::None(inner),
            Compression::Gzip => CodecReader::Gzip(GzDecoder::new(inner)),
            Compression::Snappy => CodecReader::Snappy(snap::read::FrameDecoder::new(inner)),
        }
    }
}

impl<R: Read> Read for CodecReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            CodecReader::None(r) => r.read(buf),
            CodecReader::Gzip(dec) => dec.read(buf),
            CodecReader::Snappy(dec) => dec.read(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn round_trip(compression: Compression) {
        let payload = b"the quick brown fox jumps over the lazy dog".repeat(50);

        let mut buf = Vec::new();
        {
            let mut w = CodecWriter::new(compression, &mut buf);
            w.write_all(&payload).unwrap();
            w.finish().unwrap();
        }

        let mut r = CodecReader::new(compression, Cursor::new(buf));
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn none_round_trips() {
        round_trip(Compression::None);
    }

    #[test]
    fn gzip_round_trips() {
        round_trip(Compression::Gzip);
    }

    #[test]
    fn snappy_round_trips() {
        round_trip(Compression::Snappy);
    }
}
