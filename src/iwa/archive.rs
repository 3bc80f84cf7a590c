//! IWA Archive Envelope
//!
//! Each record group in a decompressed IWA stream starts with a
//! length-delimited `TSP.ArchiveInfo` header. Its `MessageInfo` entries
//! announce the type and byte length of the bodies that immediately follow.

use std::io::Read;

use prost::Message;

use crate::iwa::varint;
use crate::iwa::{Error, Result};

/// Archive information header for each object in an IWA file
#[derive(Clone, PartialEq, Message)]
pub struct ArchiveInfo {
    /// Unique identifier for this archive across the document
    #[prost(uint64, optional, tag = "1")]
    pub identifier: Option<u64>,
    /// Information about the messages contained in this archive
    #[prost(message, repeated, tag = "2")]
    pub message_infos: Vec<MessageInfo>,
    #[prost(bool, optional, tag = "3")]
    pub should_merge: Option<bool>,
}

/// Information about a specific message within an archive
#[derive(Clone, PartialEq, Message)]
pub struct MessageInfo {
    /// Message type identifier (maps to specific protobuf message types)
    #[prost(uint32, required, tag = "1")]
    pub r#type: u32,
    /// Version information for the message format
    #[prost(uint32, repeated, packed = "true", tag = "2")]
    pub version: Vec<u32>,
    /// Length of the message data in bytes
    #[prost(uint32, required, tag = "3")]
    pub length: u32,
}

impl ArchiveInfo {
    /// Total body bytes announced by this header
    pub fn body_length(&self) -> u64 {
        self.message_infos.iter().map(|mi| mi.length as u64).sum()
    }
}

impl MessageInfo {
    pub fn new(r#type: u32, length: u32) -> Self {
        Self {
            r#type,
            version: Vec::new(),
            length,
        }
    }
}

/// Read the next length-delimited `ArchiveInfo`
///
/// Returns `Ok(None)` when the stream ends cleanly before a new header; a
/// header cut short or failing to decode is a [`Error::MalformedRecord`].
pub fn read_archive_info<R: Read + ?Sized>(reader: &mut R) -> Result<Option<ArchiveInfo>> {
    let length = match varint::read_varint(reader) {
        Ok(Some(length)) => length,
        Ok(None) => return Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(Error::MalformedRecord(
                "stream ended inside an ArchiveInfo length".to_string(),
            ));
        },
        Err(e) => return Err(e.into()),
    };

    let mut data = Vec::with_capacity(length.min(64 * 1024) as usize);
    reader.take(length).read_to_end(&mut data)?;
    if (data.len() as u64) < length {
        return Err(Error::MalformedRecord(format!(
            "ArchiveInfo truncated: expected {} bytes, got {}",
            length,
            data.len()
        )));
    }

    Ok(Some(ArchiveInfo::decode(data.as_slice())?))
}
