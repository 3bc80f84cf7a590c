//! Snappy decompression for iWork IWA files
//!
//! iWork uses a custom Snappy framing format that differs from the standard:
//! - No stream identifier chunk
//! - No CRC-32C checksums
//! - Custom chunk header format (4 bytes: type + 24-bit length)
//!
//! [`FrameReader`] decodes one chunk at a time, so a record stream can be
//! walked without holding the whole decompressed file in memory.

use std::io::{self, Read};

use snap::raw::{Decoder, decompress_len};

use crate::iwa::{Error, Result};

/// Raw Snappy block, no checksum
const CHUNK_COMPRESSED: u8 = 0x00;
/// Stored block, no checksum
const CHUNK_UNCOMPRESSED: u8 = 0x01;
/// Padding, skipped
const CHUNK_PADDING: u8 = 0xFE;

/// Largest decompressed size a single chunk may declare (10 MiB)
pub const MAX_CHUNK_LEN: usize = 10 * 1024 * 1024;

/// Streaming decompressor for the IWA chunk framing
pub struct FrameReader<R> {
    inner: R,
    decoder: Decoder,
    compressed: Vec<u8>,
    chunk: Vec<u8>,
    pos: usize,
    finished: bool,
}

impl<R: Read> FrameReader<R> {
    /// Wrap a raw `.iwa` entry stream
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            decoder: Decoder::new(),
            compressed: Vec::new(),
            chunk: Vec::new(),
            pos: 0,
            finished: false,
        }
    }

    /// Decode the next non-empty chunk into the buffer
    ///
    /// Returns `false` once the underlying stream ends on a chunk boundary.
    fn fill_chunk(&mut self) -> Result<bool> {
        loop {
            // Read 4-byte header
            let mut header = [0u8; 4];
            let got = read_full(&mut self.inner, &mut header)?;
            if got == 0 {
                return Ok(false);
            }
            if got < header.len() {
                return Err(Error::Snappy(format!(
                    "stream ended inside a chunk header ({got} of 4 bytes)"
                )));
            }

            let chunk_type = header[0];
            // Extract 24-bit length (little-endian)
            let length = u32::from_le_bytes([header[1], header[2], header[3], 0]) as usize;

            self.compressed.resize(length, 0);
            let got = read_full(&mut self.inner, &mut self.compressed)?;
            if got < length {
                return Err(Error::Snappy(format!(
                    "chunk truncated: expected {length} bytes, got {got}"
                )));
            }

            match chunk_type {
                CHUNK_COMPRESSED => {
                    if length == 0 {
                        continue;
                    }
                    let size = decompress_len(&self.compressed)
                        .map_err(|e| Error::Snappy(format!("Invalid chunk length: {}", e)))?;
                    if size > MAX_CHUNK_LEN {
                        return Err(Error::Snappy(format!(
                            "chunk declares {size} bytes, limit is {MAX_CHUNK_LEN}"
                        )));
                    }
                    self.chunk.resize(size, 0);
                    let written = self
                        .decoder
                        .decompress(&self.compressed, &mut self.chunk)
                        .map_err(|e| Error::Snappy(format!("Decompression failed: {}", e)))?;
                    self.chunk.truncate(written);
                },
                CHUNK_UNCOMPRESSED => {
                    std::mem::swap(&mut self.chunk, &mut self.compressed);
                },
                CHUNK_PADDING | 0x80..=0xFD => continue,
                other => {
                    return Err(Error::Snappy(format!(
                        "Unexpected chunk type: {}, expected 0",
                        other
                    )));
                },
            }

            self.pos = 0;
            if !self.chunk.is_empty() {
                return Ok(true);
            }
        }
    }

    /// Unwrap the raw stream
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for FrameReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.finished {
            return Ok(0);
        }
        if self.pos == self.chunk.len() && !self.fill_chunk()? {
            self.finished = true;
            return Ok(0);
        }

        let available = &self.chunk[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl<R> std::fmt::Debug for FrameReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("buffered", &(self.chunk.len() - self.pos))
            .field("finished", &self.finished)
            .finish()
    }
}

/// Read until `buf` is full or the stream ends, returning the bytes read
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
