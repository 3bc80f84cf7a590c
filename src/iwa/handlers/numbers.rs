//! Numbers handlers

use std::sync::Arc;

use crate::iwa::handlers::keys;
use crate::iwa::protobuf::{decode_body, tn};
use crate::iwa::{ArchiveInfo, Context, DispatchTable, MessageInfo, RecordBody, Result};

/// TN.SheetArchive
pub const SHEET_ARCHIVE: u32 = 2;

pub fn table(base: Arc<DispatchTable>) -> DispatchTable {
    let mut table = DispatchTable::with_fallback(base);
    table.set_action(SHEET_ARCHIVE, sheet_archive);
    table
}

fn sheet_archive(
    _archive_info: &ArchiveInfo,
    _message_info: &MessageInfo,
    body: &mut RecordBody<'_>,
    ctx: &mut Context<'_>,
) -> Result<()> {
    let sheet: tn::SheetArchive = decode_body(body)?;
    ctx.count(keys::SHEET_COUNT);
    if !sheet.name.is_empty() {
        ctx.emit_text(&sheet.name, &[]);
    }
    Ok(())
}
