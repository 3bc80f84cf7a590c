//! iwa-extract - Text and metadata extraction for Apple iWork documents
//!
//! This library decodes the IWA (iWork Archive) container used by Pages,
//! Keynote and Numbers '13 and later, and dispatches the decoded protobuf
//! records to per-kind handler tables that report text and metadata to a
//! caller-supplied sink.
//!
//! # Features
//!
//! - **Container navigation**: bundle directories, single-file documents with
//!   a nested `Index.zip` or an unpacked `Index/` directory
//! - **Streaming decoding**: Snappy chunks and record bodies are decoded one
//!   at a time, with unread bodies skipped precisely
//! - **Kind detection**: Pages, Keynote or Numbers guessed from message types
//! - **Layered dispatch**: kind-specific handler tables over a shared base
//! - **Cancellation and malformed-record policies** per parse
//!
//! # Example - Extracting text
//!
//! ```no_run
//! use iwa_extract::extract_path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = extract_path("report.pages")?;
//! println!("Document text: {}", document.text);
//! for (key, value) in &document.metadata {
//!     println!("{key}: {value}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Known kind with a custom sink
//!
//! ```no_run
//! use iwa_extract::{Container, DocumentKind, ParseOptions, Sink, TextAttribute, parse};
//!
//! struct Printer;
//!
//! impl Sink for Printer {
//!     fn text_block(&mut self, text: &str, _attributes: &[TextAttribute]) {
//!         println!("{text}");
//!     }
//!
//!     fn metadata_entry(&mut self, key: &str, value: &str) {
//!         println!("{key} = {value}");
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let container = Container::open("budget.numbers")?;
//! parse(&container, DocumentKind::Numbers, &mut Printer, &ParseOptions::default())?;
//! # Ok(())
//! # }
//! ```

/// iWork Archive (IWA) decoding and record dispatch
///
/// This module contains the container navigator, the record stream decoder,
/// the kind classifier and the built-in handler tables.
pub mod iwa;

// Re-export commonly used types for convenience
pub use iwa::{
    CancellationToken, Container, DocumentKind, Error, ExtractedDocument, ParseOptions, Profile,
    Result, Sink, TextAttribute, TextCollector, classify, extract, extract_path, parse,
    parse_with_profile,
};
