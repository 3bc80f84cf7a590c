//! Document Kind Detection for iWork Applications
//!
//! Pages, Keynote and Numbers share one container layout, so the kind of an
//! unknown document is guessed from the message type ids inside its IWA
//! streams. Each application owns a reference set of ids; an id found in
//! exactly one set decides the kind.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use phf::phf_set;
use serde::{Deserialize, Serialize};

use crate::iwa::archive::read_archive_info;
use crate::iwa::bounded::BoundedReader;
use crate::iwa::options::CancellationToken;
use crate::iwa::snappy::FrameReader;
use crate::iwa::{Error, Result};

/// Application type for iWork documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Apple Pages
    Pages,
    /// Apple Keynote
    Keynote,
    /// Apple Numbers
    Numbers,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Pages,
        DocumentKind::Keynote,
        DocumentKind::Numbers,
    ];

    /// Whether `type_id` is in this kind's reference set
    pub fn recognizes(self, type_id: u32) -> bool {
        match self {
            Self::Pages => PAGES_TYPES.contains(&type_id),
            Self::Keynote => KEYNOTE_TYPES.contains(&type_id),
            Self::Numbers => NUMBERS_TYPES.contains(&type_id),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pages => "pages",
            Self::Keynote => "keynote",
            Self::Numbers => "numbers",
        };
        f.write_str(name)
    }
}

impl FromStr for DocumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pages" => Ok(Self::Pages),
            "keynote" | "key" => Ok(Self::Keynote),
            "numbers" => Ok(Self::Numbers),
            _ => Err(Error::UndeterminedKind),
        }
    }
}

/// Keynote message types
static KEYNOTE_TYPES: phf::Set<u32> = phf_set! {
    1u32, 2u32, 3u32, 4u32, 5u32, 6u32, 7u32, 8u32, 9u32, 10u32, 11u32, 12u32, 13u32,
    14u32, 15u32, 16u32, 17u32, 18u32, 19u32, 20u32, 21u32, 22u32, 23u32, 24u32, 25u32,
    100u32, 101u32, 102u32, 103u32, 104u32, 105u32, 106u32, 107u32, 108u32, 109u32,
    110u32, 111u32, 112u32, 113u32, 114u32, 115u32, 116u32, 117u32, 118u32, 119u32,
    123u32, 124u32, 128u32, 129u32, 130u32, 131u32, 132u32, 133u32, 134u32, 135u32,
    136u32, 137u32, 138u32, 139u32, 140u32, 141u32, 142u32, 143u32, 144u32, 145u32,
    146u32, 147u32, 148u32, 10011u32,
};

/// Pages message types
static PAGES_TYPES: phf::Set<u32> = phf_set! {
    7u32, 10000u32, 10001u32, 10010u32, 10011u32, 10012u32, 10015u32, 10101u32,
    10102u32, 10108u32, 10109u32, 10110u32, 10111u32, 10112u32, 10113u32, 10114u32,
    10115u32, 10116u32, 10117u32, 10118u32, 10119u32, 10120u32, 10121u32, 10125u32,
    10126u32, 10127u32, 10128u32, 10130u32, 10131u32, 10132u32, 10133u32, 10134u32,
    10140u32, 10141u32, 10142u32, 10143u32, 10147u32, 10148u32, 10149u32, 10150u32,
    10151u32, 10152u32, 10153u32, 10154u32, 10155u32, 10156u32, 10157u32,
};

/// Numbers message types
static NUMBERS_TYPES: phf::Set<u32> = phf_set! {
    1u32, 2u32, 3u32, 7u32, 10011u32, 12002u32, 12003u32, 12004u32, 12005u32,
    12006u32, 12008u32, 12009u32, 12010u32, 12011u32, 12012u32, 12013u32, 12014u32,
    12015u32, 12016u32, 12017u32, 12018u32, 12019u32, 12021u32, 12024u32, 12025u32,
    12026u32, 12027u32, 12028u32, 12030u32,
};

/// The kind owning `type_id` alone, if any
pub fn classify_type_id(type_id: u32) -> Option<DocumentKind> {
    let mut owners = DocumentKind::ALL
        .into_iter()
        .filter(|kind| kind.recognizes(type_id));
    match (owners.next(), owners.next()) {
        (Some(kind), None) => Some(kind),
        _ => None,
    }
}

/// The kind decided by the first unambiguous id in `type_ids`
pub fn classify_ids<I: IntoIterator<Item = u32>>(type_ids: I) -> Option<DocumentKind> {
    type_ids.into_iter().find_map(classify_type_id)
}

/// Walk one raw `.iwa` stream read-only until its kind is evident
///
/// Bodies are skipped without decoding. Returns `Ok(None)` when the stream
/// ends without an unambiguous id, or when `cancel` fires.
pub fn sniff_stream<R: Read>(raw: R, cancel: &CancellationToken) -> Result<Option<DocumentKind>> {
    let mut body = BoundedReader::new(FrameReader::new(raw));

    while !cancel.is_cancelled() {
        let Some(archive_info) = read_archive_info(body.between_records()?)? else {
            break;
        };

        for message_info in &archive_info.message_infos {
            body.set_readable_bytes(message_info.length as u64)?;
            if let Some(kind) = classify_type_id(message_info.r#type) {
                log::debug!(
                    "type {} identifies a {} document",
                    message_info.r#type,
                    kind
                );
                return Ok(Some(kind));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iwa::fixtures::{IwaBuilder, frame};
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn test_exclusive_ids() {
        assert_eq!(classify_type_id(10000), Some(DocumentKind::Pages));
        assert_eq!(classify_type_id(5), Some(DocumentKind::Keynote));
        assert_eq!(classify_type_id(12002), Some(DocumentKind::Numbers));
    }

    #[test]
    fn test_shared_and_unknown_ids() {
        // 1 is Keynote and Numbers, 7 and 10011 are in all three sets
        assert_eq!(classify_type_id(1), None);
        assert_eq!(classify_type_id(7), None);
        assert_eq!(classify_type_id(10011), None);
        // Common text storage is in none
        assert_eq!(classify_type_id(2001), None);
    }

    #[test]
    fn test_first_unambiguous_wins() {
        assert_eq!(
            classify_ids([1, 2001, 7, 12003, 10000]),
            Some(DocumentKind::Numbers)
        );
        assert_eq!(classify_ids([1, 2, 3, 7]), None);
        assert_eq!(classify_ids(std::iter::empty()), None);
    }

    #[test]
    fn test_from_str_and_display() {
        assert_eq!("Pages".parse::<DocumentKind>().unwrap(), DocumentKind::Pages);
        assert_eq!("key".parse::<DocumentKind>().unwrap(), DocumentKind::Keynote);
        assert_eq!("numbers".parse::<DocumentKind>().unwrap(), DocumentKind::Numbers);
        assert!("unknown".parse::<DocumentKind>().is_err());
        for kind in DocumentKind::ALL {
            assert_eq!(kind.to_string().parse::<DocumentKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_sniff_stops_at_first_match() {
        let raw = IwaBuilder::new()
            .group(1, &[(1, vec![0; 3]), (2001, vec![0; 5])])
            .group(2, &[(12002, vec![0; 2])])
            // Never reached: a Pages id after the Numbers match.
            .group(3, &[(10000, vec![0; 2])])
            .build();

        let kind = sniff_stream(Cursor::new(raw), &CancellationToken::new()).unwrap();
        assert_eq!(kind, Some(DocumentKind::Numbers));
    }

    #[test]
    fn test_sniff_undetermined() {
        let raw = IwaBuilder::new()
            .group(1, &[(1, vec![1, 2]), (7, vec![])])
            .build();
        let kind = sniff_stream(Cursor::new(raw), &CancellationToken::new()).unwrap();
        assert_eq!(kind, None);

        let empty = frame(&[]);
        assert_eq!(
            sniff_stream(Cursor::new(empty), &CancellationToken::new()).unwrap(),
            None
        );
    }

    #[test]
    fn test_sniff_honours_cancellation() {
        let raw = IwaBuilder::new().group(1, &[(10000, vec![])]).build();
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(sniff_stream(Cursor::new(raw), &token).unwrap(), None);
    }

    fn reference(ids: &[u32]) -> Option<DocumentKind> {
        for &id in ids {
            let keynote = KEYNOTE_TYPES.contains(&id);
            let pages = PAGES_TYPES.contains(&id);
            let numbers = NUMBERS_TYPES.contains(&id);
            match (keynote, pages, numbers) {
                (true, false, false) => return Some(DocumentKind::Keynote),
                (false, true, false) => return Some(DocumentKind::Pages),
                (false, false, true) => return Some(DocumentKind::Numbers),
                _ => {},
            }
        }
        None
    }

    fn type_id_strategy() -> impl Strategy<Value = u32> {
        prop_oneof![
            0u32..160,
            9990u32..10200,
            11990u32..12040,
            Just(2001u32),
        ]
    }

    proptest! {
        #[test]
        fn prop_classification_is_deterministic(
            ids in prop::collection::vec(type_id_strategy(), 0..12)
        ) {
            let first = classify_ids(ids.iter().copied());
            prop_assert_eq!(first, classify_ids(ids.iter().copied()));
            prop_assert_eq!(first, reference(&ids));

            let raw = ids
                .iter()
                .fold(IwaBuilder::new(), |builder, &id| builder.group(1, &[(id, vec![0; 2])]))
                .build();
            let sniffed = sniff_stream(Cursor::new(raw), &CancellationToken::new()).unwrap();
            prop_assert_eq!(sniffed, first);
        }
    }
}
