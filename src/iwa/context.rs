//! Per-document Parse State
//!
//! A [`Context`] lives for exactly one parse. It holds the [`Profile`] that
//! makes the parse kind-specific, the text blocks collected so far, the set
//! of identifiers whose text must be suppressed, and the sink borrow through
//! which everything leaves the parser.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, Read};

use crate::iwa::{ArchiveInfo, DispatchTable, DocumentKind, Profile, Result, Sink};

/// Position of an attached object inside a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextAttribute {
    pub character_index: u32,
    /// Identifier of the referenced object, if the attribute carries one
    pub object: Option<u64>,
}

/// Text collected for one identifier, emitted when the index is finished
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub identifier: u64,
    pub text: String,
    pub attributes: Option<Vec<TextAttribute>>,
}

/// Mutable state of one document parse
pub struct Context<'a> {
    profile: &'a Profile,
    document_name: String,
    current_file: Option<String>,
    blocks: Vec<TextBlock>,
    block_index: HashMap<u64, usize>,
    ignorable: HashSet<u64>,
    counters: BTreeMap<&'static str, u64>,
    next_anonymous: u64,
    group_identifier: Option<u64>,
    sink: &'a mut dyn Sink,
}

impl<'a> Context<'a> {
    pub fn new(
        profile: &'a Profile,
        document_name: impl Into<String>,
        sink: &'a mut dyn Sink,
    ) -> Self {
        Self {
            profile,
            document_name: document_name.into(),
            current_file: None,
            blocks: Vec::new(),
            block_index: HashMap::new(),
            ignorable: HashSet::new(),
            counters: BTreeMap::new(),
            next_anonymous: u64::MAX,
            group_identifier: None,
            sink,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.profile.kind
    }

    pub fn profile(&self) -> &'a Profile {
        self.profile
    }

    /// The dispatch table records are looked up in
    pub fn actions(&self) -> &'a DispatchTable {
        let profile: &'a Profile = self.profile;
        profile.actions.as_ref()
    }

    /// Base name of the document being parsed
    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    /// Rename the document once its index archive reveals the real name
    pub fn set_document_name(&mut self, name: &str) {
        if self.document_name != name {
            self.document_name = name.to_string();
        }
    }

    /// Name of the index entry currently being decoded
    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    /// Get or create the text block for `identifier`
    pub fn text_block(&mut self, identifier: u64) -> &mut TextBlock {
        let index = match self.block_index.get(&identifier) {
            Some(&index) => index,
            None => {
                self.blocks.push(TextBlock {
                    identifier,
                    ..Default::default()
                });
                self.block_index.insert(identifier, self.blocks.len() - 1);
                self.blocks.len() - 1
            },
        };
        &mut self.blocks[index]
    }

    /// A fresh identifier for a record group that carries none
    ///
    /// Allocated downwards from `u64::MAX`, so they stay clear of the small
    /// identifiers real documents use.
    pub fn anonymous_identifier(&mut self) -> u64 {
        let identifier = self.next_anonymous;
        self.next_anonymous -= 1;
        identifier
    }

    /// Start a new record group; records of one group share an identifier
    pub fn begin_group(&mut self) {
        self.group_identifier = None;
    }

    /// The group's identifier, or the anonymous one allocated for this group
    pub fn record_identifier(&mut self, archive_info: &ArchiveInfo) -> u64 {
        if let Some(identifier) = archive_info.identifier {
            return identifier;
        }
        match self.group_identifier {
            Some(identifier) => identifier,
            None => {
                let identifier = self.anonymous_identifier();
                self.group_identifier = Some(identifier);
                identifier
            },
        }
    }

    /// Suppress text owned by or referencing `identifier`
    pub fn ignore(&mut self, identifier: u64) {
        self.ignorable.insert(identifier);
    }

    pub fn is_ignorable(&self, identifier: u64) -> bool {
        self.ignorable.contains(&identifier)
    }

    /// Increment the counter `key`, reported as metadata at the end of the index
    pub fn count(&mut self, key: &'static str) {
        *self.counters.entry(key).or_default() += 1;
    }

    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Send text to the sink immediately
    pub fn emit_text(&mut self, text: &str, attributes: &[TextAttribute]) {
        self.sink.text_block(text, attributes);
    }

    pub fn emit_metadata(&mut self, key: &str, value: &str) {
        self.sink.metadata_entry(key, value);
    }

    pub fn begin_document(&mut self) {
        log::debug!("begin {} document {}", self.profile.kind, self.document_name);
        self.sink.begin_document();
    }

    pub fn end_document(&mut self) {
        log::debug!("end document {}", self.document_name);
        self.sink.end_document();
    }

    pub fn begin_index(&mut self) {
        self.blocks.clear();
        self.block_index.clear();
        self.counters.clear();
    }

    /// Flush collected text blocks in first-reference order, then counters
    pub fn end_index(&mut self) {
        let blocks = std::mem::take(&mut self.blocks);
        self.block_index.clear();

        for block in blocks {
            if block.text.is_empty() || self.is_ignorable(block.identifier) {
                continue;
            }
            let attributes = block.attributes.as_deref().unwrap_or(&[]);
            if attributes
                .iter()
                .filter_map(|attr| attr.object)
                .any(|object| self.ignorable.contains(&object))
            {
                log::debug!("suppressing placeholder text of object {}", block.identifier);
                continue;
            }
            self.sink.text_block(&block.text, attributes);
        }

        let counters = std::mem::take(&mut self.counters);
        let mut buffer = itoa::Buffer::new();
        for (key, value) in counters {
            self.sink.metadata_entry(key, buffer.format(value));
        }
    }

    pub fn begin_file(&mut self, name: &str) {
        log::debug!("decoding {name}");
        self.current_file = Some(name.to_string());
    }

    pub fn end_file(&mut self, _name: &str) {
        self.current_file = None;
    }

    /// Whether the content entry `name` should be decoded
    pub fn accept_file(&self, name: &str) -> bool {
        (self.profile.entry_filter)(name)
    }

    /// Drain an entry that will not be decoded
    pub fn skip_file(&mut self, name: &str, reader: &mut dyn Read) -> Result<()> {
        let skipped = io::copy(reader, &mut io::sink())?;
        log::debug!("skipped {name} ({skipped} bytes)");
        Ok(())
    }
}
