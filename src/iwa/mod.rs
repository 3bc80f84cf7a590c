//! iWork Archive Format Support
//!
//! This module decodes Apple's iWork file formats (Pages, Keynote, Numbers),
//! which all store their content in the IWA (iWork Archive) format, and
//! dispatches the decoded records to per-kind handler tables.
//!
//! ## iWork File Structure
//!
//! iWork documents are either bundles (directories) or single zip files
//! containing:
//! - `Index.zip` (bundles, older single files) or an unpacked `Index/`
//!   directory: the IWA files with serialized objects
//! - `Data/`: media assets
//! - `Metadata/`: document metadata and properties
//!
//! ## IWA Format
//!
//! Each `.iwa` file contains:
//! - Snappy-compressed data (custom framing without stream identifier)
//! - A sequence of record groups: a varint length, an `ArchiveInfo` header
//!   listing `MessageInfo` entries, then one protobuf body per entry
//!
//! ## Example
//!
//! ```rust,no_run
//! use iwa_extract::iwa::{Container, ParseOptions, TextCollector, extract};
//!
//! let container = Container::open("document.pages")?;
//! let mut collector = TextCollector::new();
//! let kind = extract(&container, &mut collector, &ParseOptions::default())?;
//! println!("{kind}: {}", collector.text());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io;

pub mod archive;
pub mod bounded;
pub mod classify;
pub mod context;
pub mod decoder;
pub mod dispatch;
pub mod handlers;
pub mod navigator;
pub mod options;
pub mod protobuf;
pub mod sink;
pub mod snappy;
pub mod varint;

#[cfg(test)]
pub(crate) mod fixtures;

/// Re-export commonly used types
pub use archive::{ArchiveInfo, MessageInfo};
pub use bounded::{BoundedReader, RecordBody};
pub use classify::DocumentKind;
pub use context::{Context, TextAttribute, TextBlock};
pub use decoder::Completion;
pub use dispatch::{DispatchTable, Handler};
pub use handlers::Profile;
pub use navigator::{
    Container, Navigator, NavigatorState, classify, extract, extract_path, parse,
    parse_with_profile,
};
pub use options::{
    AbortOnMalformed, CancellationToken, Disposition, MalformedRecordPolicy, ParseOptions,
    SkipMalformed,
};
pub use sink::{ExtractedDocument, Sink, TextCollector};
pub use snappy::FrameReader;

/// Error types for iWork parsing
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Index archive not found: {0}")]
    ContainerNotFound(String),

    #[error("Index archive has no content entries: {0}")]
    EmptyContainer(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Snappy decompression error: {0}")]
    Snappy(String),

    #[error("Read of {requested} bytes exceeds the {remaining} bytes left in the record")]
    BoundsExceeded { requested: u64, remaining: u64 },

    #[error("Could not determine the document kind")]
    UndeterminedKind,

    #[error("Parse cancelled")]
    Cancelled,
}

impl Error {
    /// Whether this error is a record that failed to decode, the only kind
    /// a [`MalformedRecordPolicy`] may choose to skip.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedRecord(_))
    }

    /// Whether the parse stopped because its cancellation token was set.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        // Errors raised below a `Read` impl travel wrapped in io::Error.
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            Some(Err(other)) => Error::Io(io::Error::new(kind, other)),
            None => Error::Io(io::Error::from(kind)),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(inner) => inner,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Error::MalformedRecord(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_round_trip_keeps_variant() {
        let io_err: io::Error = Error::BoundsExceeded {
            requested: 8,
            remaining: 2,
        }
        .into();
        let back: Error = io_err.into();
        assert!(matches!(
            back,
            Error::BoundsExceeded {
                requested: 8,
                remaining: 2
            }
        ));
    }

    #[test]
    fn test_plain_io_error_stays_io() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_prost_error_is_malformed() {
        use prost::Message;

        // Field 2 announces five bytes that never arrive.
        let decode_err = ArchiveInfo::decode(&[0x12u8, 0x05][..]).unwrap_err();
        let err: Error = decode_err.into();
        assert!(err.is_malformed());
    }
}
