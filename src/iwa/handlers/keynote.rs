//! Keynote handlers

use std::sync::Arc;

use crate::iwa::handlers::keys;
use crate::iwa::{ArchiveInfo, Context, DispatchTable, MessageInfo, RecordBody, Result};

/// KN.SlideArchive
pub const SLIDE_ARCHIVE: u32 = 5;

pub fn table(base: Arc<DispatchTable>) -> DispatchTable {
    let mut table = DispatchTable::with_fallback(base);
    table.set_action(SLIDE_ARCHIVE, slide_archive);
    table
}

/// Master slides carry placeholder text only
pub fn accept_entry(name: &str) -> bool {
    !name.starts_with("Index/TemplateSlide")
}

fn slide_archive(
    _archive_info: &ArchiveInfo,
    _message_info: &MessageInfo,
    _body: &mut RecordBody<'_>,
    ctx: &mut Context<'_>,
) -> Result<()> {
    ctx.count(keys::SLIDE_COUNT);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iwa::fixtures::{RecordingSink, body};
    use crate::iwa::{DocumentKind, Profile};

    #[test]
    fn test_slides_are_counted_at_end_of_index() {
        let mut sink = RecordingSink::default();
        {
            let mut ctx = Context::new(Profile::for_kind(DocumentKind::Keynote), "deck", &mut sink);
            ctx.begin_index();
            let handler = ctx.actions().lookup(SLIDE_ARCHIVE).unwrap();
            for _ in 0..3 {
                let info = MessageInfo::new(SLIDE_ARCHIVE, 2);
                let mut slide = body(vec![0x08, 0x01]);
                handler(&ArchiveInfo::default(), &info, &mut slide, &mut ctx).unwrap();
            }
            assert_eq!(ctx.counter(keys::SLIDE_COUNT), 3);
            ctx.end_index();
        }
        assert_eq!(sink.metadata(keys::SLIDE_COUNT), Some("3"));
    }

    #[test]
    fn test_template_slides_declined() {
        assert!(!accept_entry("Index/TemplateSlide-8123.iwa"));
        assert!(accept_entry("Index/Slide-8123.iwa"));
        assert!(accept_entry("Index/Document.iwa"));
    }
}
