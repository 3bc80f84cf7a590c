//! Message Type Dispatch
//!
//! A [`DispatchTable`] maps IWA message type ids to handlers. Tables are
//! layered by delegation: a specialized table keeps a reference to a base
//! table and consults it for every id it does not handle itself, so a
//! document kind inherits the shared handlers without touching them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::iwa::{ArchiveInfo, Context, MessageInfo, RecordBody, Result};

/// Record handler
///
/// Receives the group header, the record's own `MessageInfo`, its bounded
/// body and the document context. Unread body bytes are discarded by the
/// caller afterwards.
pub type Handler =
    fn(&ArchiveInfo, &MessageInfo, &mut RecordBody<'_>, &mut Context<'_>) -> Result<()>;

/// Type id to handler mapping with an optional fallback table
#[derive(Clone, Default)]
pub struct DispatchTable {
    entries: HashMap<u32, Handler>,
    fallback: Option<Arc<DispatchTable>>,
}

impl DispatchTable {
    /// Create an empty table with no fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table that delegates unknown ids to `base`
    pub fn with_fallback(base: Arc<DispatchTable>) -> Self {
        Self {
            entries: HashMap::new(),
            fallback: Some(base),
        }
    }

    /// Register `handler` for one type id, replacing any earlier handler
    /// registered in this table
    pub fn set_action(&mut self, type_id: u32, handler: Handler) -> &mut Self {
        self.entries.insert(type_id, handler);
        self
    }

    /// Register `handler` for several type ids
    pub fn set_actions(&mut self, type_ids: &[u32], handler: Handler) -> &mut Self {
        for &type_id in type_ids {
            self.entries.insert(type_id, handler);
        }
        self
    }

    /// Find the handler for `type_id`, walking the fallback chain
    pub fn lookup(&self, type_id: u32) -> Option<Handler> {
        let mut table = self;
        loop {
            if let Some(handler) = table.entries.get(&type_id) {
                return Some(*handler);
            }
            table = table.fallback.as_deref()?;
        }
    }

    /// Whether this table itself (not a fallback) handles `type_id`
    pub fn contains_own(&self, type_id: u32) -> bool {
        self.entries.contains_key(&type_id)
    }

    pub fn fallback(&self) -> Option<&Arc<DispatchTable>> {
        self.fallback.as_ref()
    }

    /// Number of ids registered directly in this table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("DispatchTable")
            .field("types", &ids)
            .field("fallback", &self.fallback)
            .finish()
    }
}
