//! Record Stream Decoding
//!
//! Walks the record groups of one decompressed `.iwa` stream and hands every
//! body to the handler registered for its type in the context's table.

use std::io::Read;

use crate::iwa::archive::read_archive_info;
use crate::iwa::{
    BoundedReader, Context, Disposition, Error, FrameReader, ParseOptions, RecordBody, Result,
};

/// How a stream walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The stream ended cleanly after the last record group
    Finished,
    /// The cancellation token was set before the stream ended
    Cancelled,
}

/// Decode one raw (still compressed) `.iwa` stream into `ctx`
pub fn decode_stream<'r, R: Read + 'r>(
    raw: R,
    ctx: &mut Context<'_>,
    options: &ParseOptions,
) -> Result<Completion> {
    let inner: Box<dyn Read + 'r> = Box::new(FrameReader::new(raw));
    decode_records(BoundedReader::new(inner), ctx, options)
}

/// Decode an already decompressed record stream
pub fn decode_records(
    mut body: RecordBody<'_>,
    ctx: &mut Context<'_>,
    options: &ParseOptions,
) -> Result<Completion> {
    let actions = ctx.actions();

    loop {
        if options.cancellation().is_cancelled() {
            log::debug!("cancelled while decoding {}", ctx.current_file().unwrap_or("<stream>"));
            return Ok(Completion::Cancelled);
        }

        let Some(archive_info) = read_archive_info(body.between_records()?)? else {
            return Ok(Completion::Finished);
        };
        ctx.begin_group();

        for message_info in &archive_info.message_infos {
            body.set_readable_bytes(message_info.length as u64)?;

            let Some(handler) = actions.lookup(message_info.r#type) else {
                continue;
            };

            let outcome = handler(&archive_info, message_info, &mut body, ctx);
            body.discard_remainder()?;

            match outcome {
                Ok(()) => {},
                Err(err) if err.is_malformed() => {
                    let disposition = options.malformed_policy().on_malformed(
                        ctx.current_file(),
                        &archive_info,
                        message_info,
                        &err,
                    );
                    if disposition == Disposition::Abort {
                        return Err(err);
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }
}

/// Treat a cancelled walk as an error
pub(crate) fn finished(completion: Completion) -> Result<()> {
    match completion {
        Completion::Finished => Ok(()),
        Completion::Cancelled => Err(Error::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iwa::fixtures::{Event, IwaBuilder, RecordingSink};
    use crate::iwa::protobuf::{tsd, tswp};
    use crate::iwa::{CancellationToken, DocumentKind, Profile, SkipMalformed};
    use prost::Message;
    use std::io::Cursor;

    fn storage(text: &str) -> tswp::StorageArchive {
        tswp::StorageArchive {
            text: vec![text.to_string()],
            in_document: Some(true),
            ..Default::default()
        }
    }

    fn comment(text: &str) -> Vec<u8> {
        tsd::CommentStorageArchive {
            text: Some(text.to_string()),
            author: None,
        }
        .encode_to_vec()
    }

    fn decode(raw: Vec<u8>, options: &ParseOptions) -> (Result<Completion>, RecordingSink) {
        let mut sink = RecordingSink::default();
        let result = {
            let mut ctx = Context::new(Profile::for_kind(DocumentKind::Pages), "doc", &mut sink);
            ctx.begin_index();
            let result = decode_stream(Cursor::new(raw), &mut ctx, options);
            if result.is_ok() {
                ctx.end_index();
            }
            result
        };
        (result, sink)
    }

    #[test]
    fn test_dispatches_known_and_skips_unknown() {
        let raw = IwaBuilder::new()
            .group(1, &[(9999, vec![1, 2, 3, 4]), (3056, comment("first"))])
            .message(2, 2001, &storage("Body text"))
            .group(3, &[(3056, comment("second")), (12345, vec![0; 10])])
            .build();

        let (result, sink) = decode(raw, &ParseOptions::default());
        assert_eq!(result.unwrap(), Completion::Finished);
        assert_eq!(
            sink.events,
            vec![
                Event::meta("hasCommentsOrAnnotations", "true"),
                Event::meta("Comments", "first"),
                Event::meta("hasCommentsOrAnnotations", "true"),
                Event::meta("Comments", "second"),
                Event::text("Body text"),
            ]
        );
    }

    #[test]
    fn test_partial_reads_do_not_desync() {
        // Nothing reads the unknown body; the storage after it must still
        // decode from the right offset.
        let raw = IwaBuilder::new()
            .group(1, &[(9999, vec![0xAA; 7]), (2001, storage("after").encode_to_vec())])
            .build();
        let (result, sink) = decode(raw, &ParseOptions::default());
        result.unwrap();
        assert_eq!(sink.texts(), vec!["after"]);
    }

    #[test]
    fn test_groups_without_identifier_stay_separate() {
        let raw = IwaBuilder::new()
            .anonymous_group(&[(2001, storage("one").encode_to_vec())])
            .anonymous_group(&[(2001, storage("two").encode_to_vec())])
            .build();
        let (result, sink) = decode(raw, &ParseOptions::default());
        result.unwrap();
        assert_eq!(sink.texts(), vec!["one", "two"]);
    }

    #[test]
    fn test_placeholder_in_anonymous_group_suppresses_its_storage() {
        let placeholder = tswp::PlaceholderSmartFieldArchive::default().encode_to_vec();
        let raw = IwaBuilder::new()
            .anonymous_group(&[
                (2001, storage("Click to add text").encode_to_vec()),
                (2031, placeholder),
            ])
            .anonymous_group(&[(2001, storage("real").encode_to_vec())])
            .build();
        let (result, sink) = decode(raw, &ParseOptions::default());
        result.unwrap();
        assert_eq!(sink.texts(), vec!["real"]);
    }

    #[test]
    fn test_malformed_record_aborts_by_default() {
        let raw = IwaBuilder::new()
            .group(1, &[(3056, vec![0x0A, 0x09, b'x'])])
            .message(2, 2001, &storage("never flushed"))
            .build();
        let (result, sink) = decode(raw, &ParseOptions::default());
        assert!(result.unwrap_err().is_malformed());
        assert!(sink.texts().is_empty());
    }

    #[test]
    fn test_skip_policy_continues_with_next_record() {
        let raw = IwaBuilder::new()
            .group(1, &[(3056, vec![0x0A, 0x09, b'x']), (3056, comment("kept"))])
            .message(2, 2001, &storage("still here"))
            .build();
        let options = ParseOptions::new().with_malformed_policy(SkipMalformed::new());
        let (result, sink) = decode(raw, &options);
        assert_eq!(result.unwrap(), Completion::Finished);
        assert_eq!(sink.metadata("Comments"), Some("kept"));
        assert_eq!(sink.texts(), vec!["still here"]);
    }

    #[test]
    fn test_cancellation_stops_before_next_group() {
        let token = CancellationToken::new();
        token.cancel();
        let raw = IwaBuilder::new().message(1, 2001, &storage("unseen")).build();
        let options = ParseOptions::new().with_cancellation(token);

        let (result, sink) = decode(raw, &options);
        assert_eq!(result.unwrap(), Completion::Cancelled);
        assert!(sink.events.is_empty());
        assert!(finished(Completion::Cancelled).unwrap_err().is_cancelled());
        assert!(finished(Completion::Finished).is_ok());
    }

    #[test]
    fn test_truncated_body_is_malformed() {
        let builder = IwaBuilder::new().group(1, &[(9999, vec![0; 16])]);
        // Drop the last four body bytes before framing.
        let raw = builder.raw();
        let raw = crate::iwa::fixtures::frame(&raw[..raw.len() - 4]);
        let (result, _) = decode(raw, &ParseOptions::default());
        assert!(result.unwrap_err().is_malformed());
    }
}
