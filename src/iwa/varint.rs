//! Variable-length integer decoding for IWA record streams
//!
//! Each record group in an IWA stream is prefixed by the length of its
//! `ArchiveInfo`, written as a Protocol Buffers base-128 varint: 7-bit
//! chunks, least significant first, with the high bit marking continuation.

use std::io::{self, Read};

/// Longest legal encoding of a `u64`
const MAX_VARINT_LEN: usize = 10;

/// Decode a variable-length integer from a reader
///
/// Returns `Ok(None)` when the reader is already exhausted, so callers can
/// tell a clean end of stream apart from a value cut off mid-way (which is
/// reported as `UnexpectedEof`).
pub fn read_varint<R: Read + ?Sized>(reader: &mut R) -> io::Result<Option<u64>> {
    let mut value: u64 = 0;
    let mut buf = [0u8; 1];

    for index in 0..MAX_VARINT_LEN {
        if reader.read(&mut buf)? == 0 {
            if index == 0 {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended inside a varint",
            ));
        }

        let byte = buf[0];
        value |= ((byte & 0x7F) as u64) << (7 * index);

        if (byte & 0x80) == 0 {
            return Ok(Some(value));
        }
    }

    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "Variable-length integer overflow",
    ))
}

/// Encode a u64 value as a variable-length integer
pub fn encode_varint(mut value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_VARINT_LEN);
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
    buf
}
