//! Built-in Record Handlers
//!
//! Handlers are grouped into one table per document kind. The common table
//! holds everything the three applications share; each kind's table adds
//! its own records on top and falls back to the common table for the rest.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::iwa::{DispatchTable, DocumentKind};

pub mod common;
pub mod keynote;
pub mod numbers;
pub mod pages;

/// Metadata keys emitted by the built-in handlers
pub mod keys {
    pub const ACTIVITY_LOG_COUNT: &str = "ActivityLogCount";
    pub const NEEDS_MOVIE_COMPATIBILITY_UPGRADE: &str = "NeedsMovieCompatibilityUpgrade";
    pub const HAS_COMMENTS_OR_ANNOTATIONS: &str = "hasCommentsOrAnnotations";
    pub const COMMENTS: &str = "Comments";

    pub const PAGE_WIDTH: &str = "PageWidth";
    pub const PAGE_HEIGHT: &str = "PageHeight";
    pub const PAGE_SCALE: &str = "PageScale";
    pub const ORIENTATION: &str = "Orientation";
    pub const RIGHT_MARGIN: &str = "RightMargin";
    pub const TOP_MARGIN: &str = "TopMargin";
    pub const BOTTOM_MARGIN: &str = "BottomMargin";
    pub const HEADER_MARGIN: &str = "HeaderMargin";
    pub const FOOTER_MARGIN: &str = "FooterMargin";
    pub const CITATION_RECORDS_COUNT: &str = "CitationRecordsCount";
    pub const PREVENT_IMAGE_CONVERSION_ON_OPEN: &str = "PreventImageConversionOnOpen";

    pub const SLIDE_COUNT: &str = "SlideCount";
    pub const SHEET_COUNT: &str = "SheetCount";
}

/// Handlers shared by every document kind
pub static COMMON_ACTIONS: Lazy<Arc<DispatchTable>> = Lazy::new(|| Arc::new(common::table()));

/// Pages handlers, falling back to [`COMMON_ACTIONS`]
pub static PAGES_ACTIONS: Lazy<Arc<DispatchTable>> =
    Lazy::new(|| Arc::new(pages::table(Arc::clone(&COMMON_ACTIONS))));

/// Keynote handlers, falling back to [`COMMON_ACTIONS`]
pub static KEYNOTE_ACTIONS: Lazy<Arc<DispatchTable>> =
    Lazy::new(|| Arc::new(keynote::table(Arc::clone(&COMMON_ACTIONS))));

/// Numbers handlers, falling back to [`COMMON_ACTIONS`]
pub static NUMBERS_ACTIONS: Lazy<Arc<DispatchTable>> =
    Lazy::new(|| Arc::new(numbers::table(Arc::clone(&COMMON_ACTIONS))));

static PAGES_PROFILE: Lazy<Profile> =
    Lazy::new(|| Profile::new(DocumentKind::Pages, Arc::clone(&PAGES_ACTIONS)));

static KEYNOTE_PROFILE: Lazy<Profile> = Lazy::new(|| {
    Profile::new(DocumentKind::Keynote, Arc::clone(&KEYNOTE_ACTIONS))
        .with_entry_filter(keynote::accept_entry)
});

static NUMBERS_PROFILE: Lazy<Profile> =
    Lazy::new(|| Profile::new(DocumentKind::Numbers, Arc::clone(&NUMBERS_ACTIONS)));

/// What makes a parse kind-specific: the kind tag, the table records are
/// dispatched through and the filter deciding which content entries to decode
#[derive(Debug, Clone)]
pub struct Profile {
    pub kind: DocumentKind,
    pub actions: Arc<DispatchTable>,
    pub entry_filter: fn(&str) -> bool,
}

impl Profile {
    /// Profile decoding every content entry
    pub fn new(kind: DocumentKind, actions: Arc<DispatchTable>) -> Self {
        Self {
            kind,
            actions,
            entry_filter: accept_all,
        }
    }

    pub fn with_entry_filter(mut self, filter: fn(&str) -> bool) -> Self {
        self.entry_filter = filter;
        self
    }

    /// The built-in profile for `kind`
    pub fn for_kind(kind: DocumentKind) -> &'static Profile {
        match kind {
            DocumentKind::Pages => &*PAGES_PROFILE,
            DocumentKind::Keynote => &*KEYNOTE_PROFILE,
            DocumentKind::Numbers => &*NUMBERS_PROFILE,
        }
    }
}

fn accept_all(_name: &str) -> bool {
    true
}

/// Format a float metadata value
pub(crate) fn format_float(value: f32) -> String {
    ryu::Buffer::new().format(value).to_string()
}

/// Format an integer metadata value
pub(crate) fn format_int<I: itoa::Integer>(value: I) -> String {
    itoa::Buffer::new().format(value).to_string()
}
