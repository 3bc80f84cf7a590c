//! Protobuf Record Projections for iWork IWA Files
//!
//! The full iWork schema spans hundreds of message types. Handlers only need
//! a handful of fields from a handful of records, so each record here is a
//! projection of the real message: the fields we read, at their real tags.
//! prost skips every other field while decoding.

use prost::Message;

use crate::iwa::{RecordBody, Result};

/// Decode a complete record body as message `M`
pub fn decode_body<M: Message + Default>(body: &mut RecordBody<'_>) -> Result<M> {
    let data = body.read_remaining()?;
    Ok(M::decode(data.as_slice())?)
}

/// Shared persistence types
pub mod tsp {
    /// Reference to another archived object
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Reference {
        #[prost(uint64, required, tag = "1")]
        pub identifier: u64,
    }
}

/// Word-processing (text storage) types
pub mod tswp {
    use super::tsp;

    /// TSWP.StorageArchive: a run of document text
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StorageArchive {
        #[prost(int32, optional, tag = "1")]
        pub kind: Option<i32>,
        #[prost(string, repeated, tag = "3")]
        pub text: Vec<String>,
        #[prost(bool, optional, tag = "4")]
        pub has_itext: Option<bool>,
        #[prost(message, optional, tag = "9")]
        pub table_smartfield: Option<ObjectAttributeTable>,
        #[prost(bool, optional, tag = "10")]
        pub in_document: Option<bool>,
    }

    /// Character-indexed references to attached objects
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ObjectAttributeTable {
        #[prost(message, repeated, tag = "1")]
        pub entries: Vec<ObjectAttribute>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ObjectAttribute {
        #[prost(uint32, optional, tag = "1")]
        pub character_index: Option<u32>,
        #[prost(message, optional, tag = "2")]
        pub object: Option<tsp::Reference>,
    }

    /// TSWP.PlaceholderSmartFieldArchive: "click to edit" scaffolding
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PlaceholderSmartFieldArchive {
        #[prost(bytes = "vec", optional, tag = "1")]
        pub super_: Option<Vec<u8>>,
    }
}

/// Drawable types
pub mod tsd {
    /// TSD.CommentStorageArchive: a comment or annotation
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CommentStorageArchive {
        #[prost(string, optional, tag = "1")]
        pub text: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub author: Option<String>,
    }
}

/// Document-kit types shared by every application
pub mod tsk {
    /// TSK.DocumentArchive
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DocumentArchive {
        #[prost(string, optional, tag = "4")]
        pub locale_identifier: Option<String>,
        #[prost(bytes = "vec", repeated, tag = "6")]
        pub activity_log_entries: Vec<Vec<u8>>,
        #[prost(bool, optional, tag = "12")]
        pub prevent_image_conversion_on_open: Option<bool>,
    }
}

/// Application-level document types
pub mod tsa {
    use super::tsk;

    /// TSA.DocumentArchive
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DocumentArchive {
        #[prost(message, optional, tag = "1")]
        pub super_: Option<tsk::DocumentArchive>,
        #[prost(string, optional, tag = "3")]
        pub document_language: Option<String>,
        #[prost(bool, optional, tag = "11")]
        pub needs_movie_compatibility_upgrade: Option<bool>,
    }
}

/// Pages types
pub mod tp {
    use super::tsa;

    /// TP.DocumentArchive: page setup of a Pages document
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DocumentArchive {
        #[prost(message, optional, tag = "1")]
        pub super_: Option<tsa::DocumentArchive>,
        #[prost(float, optional, tag = "31")]
        pub right_margin: Option<f32>,
        #[prost(float, optional, tag = "32")]
        pub top_margin: Option<f32>,
        #[prost(float, optional, tag = "33")]
        pub bottom_margin: Option<f32>,
        #[prost(float, optional, tag = "34")]
        pub header_margin: Option<f32>,
        #[prost(float, optional, tag = "35")]
        pub footer_margin: Option<f32>,
        #[prost(float, optional, tag = "36")]
        pub page_width: Option<f32>,
        #[prost(float, optional, tag = "37")]
        pub page_height: Option<f32>,
        #[prost(float, optional, tag = "38")]
        pub page_scale: Option<f32>,
        #[prost(int32, optional, tag = "39")]
        pub orientation: Option<i32>,
        #[prost(bytes = "vec", repeated, tag = "51")]
        pub citation_records: Vec<Vec<u8>>,
    }
}

/// Table types
pub mod tst {
    /// TST.TableDataList: the shared string (and other) lists of a table
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TableDataList {
        #[prost(enumeration = "ListType", required, tag = "1")]
        pub list_type: i32,
        #[prost(uint32, required, tag = "2")]
        pub next_list_id: u32,
        #[prost(message, repeated, tag = "3")]
        pub entries: Vec<ListEntry>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ListEntry {
        #[prost(uint32, required, tag = "1")]
        pub key: u32,
        #[prost(uint32, required, tag = "2")]
        pub refcount: u32,
        #[prost(string, optional, tag = "3")]
        pub string: Option<String>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum ListType {
        String = 1,
        Format = 2,
        Formula = 3,
        Style = 4,
        FormulaError = 5,
        CustomFormat = 6,
        MultipleChoiceListFormat = 7,
        RichTextPayload = 8,
        ConditionalStyle = 9,
        CommentStorage = 10,
    }
}

/// Numbers types
pub mod tn {
    /// TN.SheetArchive
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SheetArchive {
        #[prost(string, required, tag = "1")]
        pub name: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iwa::fixtures::body;

    #[test]
    fn test_decode_storage_projection() {
        let storage = tswp::StorageArchive {
            text: vec!["Sample pages document".to_string()],
            in_document: Some(true),
            ..Default::default()
        };
        let decoded: tswp::StorageArchive =
            decode_body(&mut body(storage.encode_to_vec())).unwrap();
        assert_eq!(decoded, storage);
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        // Field 2 (style_sheet reference) is not projected.
        let mut data = vec![0x12, 0x02, 0x08, 0x05];
        data.extend(
            tswp::StorageArchive {
                text: vec!["kept".to_string()],
                ..Default::default()
            }
            .encode_to_vec(),
        );
        let decoded: tswp::StorageArchive = decode_body(&mut body(data)).unwrap();
        assert_eq!(decoded.text, vec!["kept".to_string()]);
    }

    #[test]
    fn test_invalid_body_is_malformed() {
        let result: Result<tswp::StorageArchive> = decode_body(&mut body(vec![0xFF, 0xFF, 0xFF]));
        assert!(result.unwrap_err().is_malformed());
    }

    #[test]
    fn test_list_type_enumeration() {
        let list = tst::TableDataList {
            list_type: tst::ListType::String as i32,
            next_list_id: 2,
            entries: Vec::new(),
        };
        assert_eq!(tst::ListType::try_from(list.list_type), Ok(tst::ListType::String));
    }
}
