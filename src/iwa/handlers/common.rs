//! Handlers shared by Pages, Keynote and Numbers

use crate::iwa::handlers::{format_int, keys};
use crate::iwa::protobuf::{decode_body, tsa, tsd, tsk, tst, tswp};
use crate::iwa::{
    ArchiveInfo, Context, DispatchTable, MessageInfo, RecordBody, Result, TextAttribute,
};

pub const STORAGE_ARCHIVE: u32 = 2001;
pub const PLACEHOLDER_SMART_FIELD: u32 = 2031;
pub const TABLE_DATA_LISTS: [u32; 2] = [6005, 6201];
pub const KIT_DOCUMENT: u32 = 200;
pub const APP_DOCUMENT: u32 = 600;
pub const COMMENT_STORAGE: u32 = 3056;

/// Build the common table
pub fn table() -> DispatchTable {
    let mut table = DispatchTable::new();
    table
        .set_action(STORAGE_ARCHIVE, storage_archive)
        .set_action(PLACEHOLDER_SMART_FIELD, placeholder_smart_field)
        .set_actions(&TABLE_DATA_LISTS, table_data_list)
        .set_action(KIT_DOCUMENT, kit_document)
        .set_action(APP_DOCUMENT, app_document)
        .set_action(COMMENT_STORAGE, comment_storage);
    table
}

/// Document text, held back until the index is complete so placeholder
/// text can still be suppressed
fn storage_archive(
    archive_info: &ArchiveInfo,
    _message_info: &MessageInfo,
    body: &mut RecordBody<'_>,
    ctx: &mut Context<'_>,
) -> Result<()> {
    let storage: tswp::StorageArchive = decode_body(body)?;
    if !storage.in_document.unwrap_or(false) {
        return Ok(());
    }

    let mut texts = storage.text.into_iter();
    let Some(text) = texts.next() else {
        return Ok(());
    };
    let extra = texts.len();
    if extra > 0 {
        log::info!(
            "Got {} text runs in one storage for {}",
            extra + 1,
            ctx.current_file().unwrap_or("<unknown>")
        );
    }

    let attributes: Vec<TextAttribute> = storage
        .table_smartfield
        .iter()
        .flat_map(|table| &table.entries)
        .filter_map(|attr| {
            Some(TextAttribute {
                character_index: attr.character_index?,
                object: attr.object.as_ref().map(|reference| reference.identifier),
            })
        })
        .collect();

    let identifier = ctx.record_identifier(archive_info);
    let block = ctx.text_block(identifier);
    block.text = text;
    block.attributes = (!attributes.is_empty()).then_some(attributes);
    Ok(())
}

fn placeholder_smart_field(
    archive_info: &ArchiveInfo,
    _message_info: &MessageInfo,
    body: &mut RecordBody<'_>,
    ctx: &mut Context<'_>,
) -> Result<()> {
    let _: tswp::PlaceholderSmartFieldArchive = decode_body(body)?;
    let identifier = ctx.record_identifier(archive_info);
    ctx.ignore(identifier);
    Ok(())
}

/// Shared cell strings of a table, emitted in key order
fn table_data_list(
    _archive_info: &ArchiveInfo,
    _message_info: &MessageInfo,
    body: &mut RecordBody<'_>,
    ctx: &mut Context<'_>,
) -> Result<()> {
    let list: tst::TableDataList = decode_body(body)?;
    if !matches!(tst::ListType::try_from(list.list_type), Ok(tst::ListType::String)) {
        return Ok(());
    }

    let mut entries = list.entries;
    entries.sort_by_key(|entry| entry.key);
    for entry in &entries {
        if let Some(string) = &entry.string {
            ctx.emit_text(string, &[]);
        }
    }
    Ok(())
}

fn kit_document(
    _archive_info: &ArchiveInfo,
    _message_info: &MessageInfo,
    body: &mut RecordBody<'_>,
    ctx: &mut Context<'_>,
) -> Result<()> {
    let document: tsk::DocumentArchive = decode_body(body)?;
    let count = format_int(document.activity_log_entries.len());
    ctx.emit_metadata(keys::ACTIVITY_LOG_COUNT, &count);
    Ok(())
}

fn app_document(
    _archive_info: &ArchiveInfo,
    _message_info: &MessageInfo,
    body: &mut RecordBody<'_>,
    ctx: &mut Context<'_>,
) -> Result<()> {
    let document: tsa::DocumentArchive = decode_body(body)?;
    let upgrade = document.needs_movie_compatibility_upgrade.unwrap_or(false);
    ctx.emit_metadata(keys::NEEDS_MOVIE_COMPATIBILITY_UPGRADE, bool_str(upgrade));
    Ok(())
}

fn comment_storage(
    _archive_info: &ArchiveInfo,
    _message_info: &MessageInfo,
    body: &mut RecordBody<'_>,
    ctx: &mut Context<'_>,
) -> Result<()> {
    let comment: tsd::CommentStorageArchive = decode_body(body)?;
    ctx.emit_metadata(keys::HAS_COMMENTS_OR_ANNOTATIONS, "true");
    ctx.emit_metadata(keys::COMMENTS, comment.text.as_deref().unwrap_or_default());
    Ok(())
}

pub(crate) fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
