//! Pages handlers

use std::sync::Arc;

use crate::iwa::handlers::common::bool_str;
use crate::iwa::handlers::{format_float, format_int, keys};
use crate::iwa::protobuf::{decode_body, tp};
use crate::iwa::{ArchiveInfo, Context, DispatchTable, MessageInfo, RecordBody, Result};

pub const DOCUMENT_ARCHIVE: u32 = 10000;

pub fn table(base: Arc<DispatchTable>) -> DispatchTable {
    let mut table = DispatchTable::with_fallback(base);
    table.set_action(DOCUMENT_ARCHIVE, document_archive);
    table
}

/// Page setup of the document
fn document_archive(
    _archive_info: &ArchiveInfo,
    _message_info: &MessageInfo,
    body: &mut RecordBody<'_>,
    ctx: &mut Context<'_>,
) -> Result<()> {
    let document: tp::DocumentArchive = decode_body(body)?;

    let geometry = [
        (keys::FOOTER_MARGIN, document.footer_margin),
        (keys::HEADER_MARGIN, document.header_margin),
        (keys::PAGE_HEIGHT, document.page_height),
        (keys::PAGE_WIDTH, document.page_width),
        (keys::PAGE_SCALE, document.page_scale),
        (keys::RIGHT_MARGIN, document.right_margin),
        (keys::TOP_MARGIN, document.top_margin),
        (keys::BOTTOM_MARGIN, document.bottom_margin),
    ];
    for (key, value) in geometry {
        ctx.emit_metadata(key, &format_float(value.unwrap_or_default()));
    }

    ctx.emit_metadata(
        keys::CITATION_RECORDS_COUNT,
        &format_int(document.citation_records.len()),
    );
    ctx.emit_metadata(
        keys::ORIENTATION,
        &format_int(document.orientation.unwrap_or_default()),
    );

    let app = document.super_.unwrap_or_default();
    let kit = app.super_.unwrap_or_default();
    ctx.emit_metadata(
        keys::PREVENT_IMAGE_CONVERSION_ON_OPEN,
        bool_str(kit.prevent_image_conversion_on_open.unwrap_or(false)),
    );
    ctx.emit_metadata(
        keys::NEEDS_MOVIE_COMPATIBILITY_UPGRADE,
        bool_str(app.needs_movie_compatibility_upgrade.unwrap_or(false)),
    );
    Ok(())
}
