//! Builders for synthetic iWork documents used across the unit tests

use std::io::{Cursor, Read, Write};

use prost::Message;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::iwa::{ArchiveInfo, BoundedReader, MessageInfo, RecordBody, Sink, TextAttribute};

/// Wrap `data` in a single compressed IWA chunk
pub fn frame(data: &[u8]) -> Vec<u8> {
    let compressed = snap::raw::Encoder::new().compress_vec(data).unwrap();
    let len = compressed.len();
    let mut out = vec![
        0x00,
        (len & 0xFF) as u8,
        ((len >> 8) & 0xFF) as u8,
        ((len >> 16) & 0xFF) as u8,
    ];
    out.extend(compressed);
    out
}

/// A bounded body over `data`, sized to all of it
pub fn body(data: Vec<u8>) -> RecordBody<'static> {
    let len = data.len() as u64;
    let inner: Box<dyn Read> = Box::new(Cursor::new(data));
    let mut body = BoundedReader::new(inner);
    body.set_readable_bytes(len).unwrap();
    body
}

/// Assembles a decompressed record stream group by group
#[derive(Debug, Default)]
pub struct IwaBuilder {
    raw: Vec<u8>,
}

impl IwaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record group with the given `(type, body)` records
    pub fn group(self, identifier: u64, records: &[(u32, Vec<u8>)]) -> Self {
        self.group_with(Some(identifier), records)
    }

    pub fn anonymous_group(self, records: &[(u32, Vec<u8>)]) -> Self {
        self.group_with(None, records)
    }

    /// Append a group whose body is a single encoded message
    pub fn message<M: Message>(self, identifier: u64, type_id: u32, message: &M) -> Self {
        self.group(identifier, &[(type_id, message.encode_to_vec())])
    }

    fn group_with(mut self, identifier: Option<u64>, records: &[(u32, Vec<u8>)]) -> Self {
        let archive_info = ArchiveInfo {
            identifier,
            message_infos: records
                .iter()
                .map(|(type_id, data)| MessageInfo::new(*type_id, data.len() as u32))
                .collect(),
            should_merge: None,
        };
        self.raw.extend(archive_info.encode_length_delimited_to_vec());
        for (_, data) in records {
            self.raw.extend_from_slice(data);
        }
        self
    }

    /// The stream before framing
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The framed `.iwa` entry bytes
    pub fn build(&self) -> Vec<u8> {
        frame(&self.raw)
    }
}

/// Build a zip archive; names ending in `/` become directory entries
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// One observed sink call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Begin,
    Text(String, Vec<TextAttribute>),
    Meta(String, String),
    End,
}

impl Event {
    pub fn text(text: &str) -> Self {
        Event::Text(text.to_string(), Vec::new())
    }

    pub fn meta(key: &str, value: &str) -> Self {
        Event::Meta(key.to_string(), value.to_string())
    }
}

/// Sink recording every call in order
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<Event>,
}

impl RecordingSink {
    pub fn texts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Text(text, _) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Last value reported for `key`
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.events.iter().rev().find_map(|event| match event {
            Event::Meta(k, v) if k == key => Some(v.as_str()),
            _ => None,
        })
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events.iter().filter(|event| *event == wanted).count()
    }
}

impl Sink for RecordingSink {
    fn begin_document(&mut self) {
        self.events.push(Event::Begin);
    }

    fn text_block(&mut self, text: &str, attributes: &[TextAttribute]) {
        self.events.push(Event::Text(text.to_string(), attributes.to_vec()));
    }

    fn metadata_entry(&mut self, key: &str, value: &str) {
        self.events.push(Event::meta(key, value));
    }

    fn end_document(&mut self) {
        self.events.push(Event::End);
    }
}
