//! Extraction Sink
//!
//! The parser reports what it finds through [`Sink`]. [`TextCollector`] is a
//! ready-made sink that gathers everything into an [`ExtractedDocument`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::iwa::TextAttribute;

/// Receiver of extraction events
///
/// `begin_document` and `end_document` bracket every parse, including parses
/// that fail; everything else arrives in between, in dispatch order.
pub trait Sink {
    fn begin_document(&mut self) {}

    /// A run of document text with optional attached-object positions
    fn text_block(&mut self, text: &str, attributes: &[TextAttribute]);

    fn metadata_entry(&mut self, key: &str, value: &str);

    fn end_document(&mut self) {}
}

/// Metadata keys whose repeated values accumulate instead of overwriting
pub const ADDITIVE_KEYS: &[&str] = &["Comments"];

/// Separator placed between accumulated values of an additive key
pub const ADDITIVE_SEPARATOR: &str = "; ";

/// Text and metadata gathered from one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Text blocks joined by newlines
    pub text: String,
    pub metadata: HashMap<String, String>,
}

/// Sink that collects a document into memory
#[derive(Debug, Default)]
pub struct TextCollector {
    document: ExtractedDocument,
}

impl TextCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.document.text
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.document.metadata.get(key).map(String::as_str)
    }

    pub fn into_document(self) -> ExtractedDocument {
        self.document
    }
}

impl Sink for TextCollector {
    fn begin_document(&mut self) {
        self.document = ExtractedDocument::default();
    }

    fn text_block(&mut self, text: &str, _attributes: &[TextAttribute]) {
        if !self.document.text.is_empty() {
            self.document.text.push('\n');
        }
        self.document.text.push_str(text);
    }

    fn metadata_entry(&mut self, key: &str, value: &str) {
        match self.document.metadata.get_mut(key) {
            Some(existing) if ADDITIVE_KEYS.contains(&key) => {
                existing.push_str(ADDITIVE_SEPARATOR);
                existing.push_str(value);
            },
            _ => {
                self.document
                    .metadata
                    .insert(key.to_string(), value.to_string());
            },
        }
    }
}
