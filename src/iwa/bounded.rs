//! Length-limited view over a decompressed record stream
//!
//! Every record body in an IWA stream is announced by a `MessageInfo`
//! length. [`BoundedReader`] holds that length and guarantees the underlying
//! stream lands exactly on the next record once the body is done with,
//! whether a handler read all of it, part of it, or none.

use std::io::{self, Read};

use crate::iwa::{Error, Result};

/// Body handed to record handlers
pub type RecordBody<'r> = BoundedReader<Box<dyn Read + 'r>>;

/// Scratch size used when dropping unread body bytes
const DISCARD_CHUNK: usize = 8 * 1024;

/// A reader that yields at most the declared number of bytes
#[derive(Debug)]
pub struct BoundedReader<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> BoundedReader<R> {
    /// Wrap a stream with nothing readable yet
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            remaining: 0,
        }
    }

    /// Declare the size of the next record body
    ///
    /// Any bytes still pending from the previous body are discarded first.
    pub fn set_readable_bytes(&mut self, n: u64) -> Result<()> {
        self.discard_remainder()?;
        self.remaining = n;
        Ok(())
    }

    /// Bytes of the current body not yet consumed
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Fill `buf` completely from the current body
    ///
    /// Fails with [`Error::BoundsExceeded`] without consuming anything when
    /// `buf` is larger than what is left.
    pub fn read_exact_bounded(&mut self, buf: &mut [u8]) -> Result<()> {
        let requested = buf.len() as u64;
        if requested > self.remaining {
            return Err(Error::BoundsExceeded {
                requested,
                remaining: self.remaining,
            });
        }
        self.read_exact(buf).map_err(truncated)?;
        Ok(())
    }

    /// Read everything left in the current body
    pub fn read_remaining(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.remaining.min(1 << 20) as usize);
        let expected = self.remaining;
        self.read_to_end(&mut data)?;
        if (data.len() as u64) < expected {
            return Err(Error::MalformedRecord(format!(
                "record body truncated: expected {} bytes, got {}",
                expected,
                data.len()
            )));
        }
        Ok(data)
    }

    /// Drop whatever part of the current body has not been read
    ///
    /// A no-op when the body was fully consumed.
    pub fn discard_remainder(&mut self) -> Result<()> {
        let mut scratch = [0u8; DISCARD_CHUNK];
        while self.remaining > 0 {
            let want = self.remaining.min(DISCARD_CHUNK as u64) as usize;
            let got = self.inner.read(&mut scratch[..want])?;
            if got == 0 {
                let missing = self.remaining;
                self.remaining = 0;
                return Err(Error::MalformedRecord(format!(
                    "record body truncated: {missing} bytes missing"
                )));
            }
            self.remaining -= got as u64;
        }
        Ok(())
    }

    /// The underlying stream, positioned between records
    ///
    /// Only valid once the current body is exhausted; envelope headers are
    /// read through this.
    pub fn between_records(&mut self) -> Result<&mut R> {
        self.discard_remainder()?;
        Ok(&mut self.inner)
    }

    /// Unwrap the underlying stream
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = self.remaining.min(buf.len() as u64) as usize;
        let got = self.inner.read(&mut buf[..want])?;
        self.remaining -= got as u64;
        Ok(got)
    }
}

fn truncated(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::MalformedRecord("record body truncated".to_string())
    } else {
        err.into()
    }
}
