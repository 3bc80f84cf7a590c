//! Container Navigation
//!
//! Locates the index archive inside an iWork container, walks its entries
//! in archive order and feeds every content entry either to the kind
//! classifier or to the record decoder.
//!
//! Supported container shapes:
//! - a bundle directory holding `Index.zip`
//! - a single-file document whose zip nests `<name>/Index.zip`
//! - a single-file document with an unpacked `Index/` directory

use std::fmt;
use std::fs;
use std::io::{Cursor, Read};
use std::ops::ControlFlow;
use std::path::Path;

use zip::ZipArchive;

use crate::iwa::classify::sniff_stream;
use crate::iwa::decoder::{decode_stream, finished};
use crate::iwa::{
    Context, DocumentKind, Error, ExtractedDocument, ParseOptions, Profile, Result, Sink,
    TextCollector,
};

/// Name of the nested index archive
const INDEX_ARCHIVE: &str = "Index.zip";
/// Prefix of entries forming an unpacked index
const INDEX_DIR: &str = "Index/";
/// Suffix of entries holding a record stream
const CONTENT_SUFFIX: &str = ".iwa";

/// An iWork document held in memory
///
/// The raw container is read once; classification and dispatch both walk
/// the same bytes.
#[derive(Clone)]
pub struct Container {
    name: String,
    source: Source,
}

#[derive(Clone)]
enum Source {
    /// Bytes of a bundle's `Index.zip`
    IndexArchive(Vec<u8>),
    /// Bytes of a single-file (zip) document
    Composite(Vec<u8>),
}

impl Container {
    /// Open a bundle directory or a single-file document
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if path.is_dir() {
            let index = path.join(INDEX_ARCHIVE);
            if !index.is_file() {
                return Err(Error::ContainerNotFound(format!(
                    "{} has no {INDEX_ARCHIVE}",
                    path.display()
                )));
            }
            log::debug!("opening bundle {}", path.display());
            Ok(Self {
                name,
                source: Source::IndexArchive(fs::read(index)?),
            })
        } else {
            Ok(Self {
                name,
                source: Source::Composite(fs::read(path)?),
            })
        }
    }

    /// Buffer a single-file document from an open stream
    pub fn from_reader<R: Read>(name: impl Into<String>, mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::from_bytes(name, bytes))
    }

    /// Wrap the bytes of a single-file document
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: Source::Composite(bytes.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (shape, len) = match &self.source {
            Source::IndexArchive(bytes) => ("bundle", bytes.len()),
            Source::Composite(bytes) => ("composite", bytes.len()),
        };
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("shape", &shape)
            .field("bytes", &len)
            .finish()
    }
}

/// Where a [`Navigator`] is in its walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorState {
    NotStarted,
    LocatingIndex,
    ClassifyingType,
    Dispatching,
    Done,
    Failed,
}

/// Drives classification and dispatch over one container
#[derive(Debug)]
pub struct Navigator<'c> {
    container: &'c Container,
    options: &'c ParseOptions,
    state: NavigatorState,
}

impl<'c> Navigator<'c> {
    pub fn new(container: &'c Container, options: &'c ParseOptions) -> Self {
        Self {
            container,
            options,
            state: NavigatorState::NotStarted,
        }
    }

    pub fn state(&self) -> NavigatorState {
        self.state
    }

    /// Guess the document kind from the first unambiguous message type
    pub fn classify(&mut self) -> Result<DocumentKind> {
        self.state = NavigatorState::LocatingIndex;
        let mut sniffer = KindSniffer {
            options: self.options,
            state: &mut self.state,
            kind: None,
        };
        let walked = walk_container(self.container, &mut sniffer);
        let result = walked.and_then(|()| match sniffer.kind {
            Some(kind) => Ok(kind),
            None if self.options.cancellation().is_cancelled() => Err(Error::Cancelled),
            None => Err(Error::UndeterminedKind),
        });

        match &result {
            Ok(kind) => log::debug!("{} classified as {kind}", self.container.name),
            Err(_) => self.state = NavigatorState::Failed,
        }
        result
    }

    /// Dispatch every accepted record through `profile` into `sink`
    ///
    /// `sink` sees `begin_document` and `end_document` even when the parse
    /// fails.
    pub fn parse(&mut self, profile: &Profile, sink: &mut dyn Sink) -> Result<()> {
        let mut ctx = Context::new(profile, self.container.name.as_str(), sink);
        ctx.begin_document();

        self.state = NavigatorState::LocatingIndex;
        let mut dispatcher = Dispatcher {
            ctx: &mut ctx,
            options: self.options,
            state: &mut self.state,
        };
        let result = walk_container(self.container, &mut dispatcher);
        if result.is_ok() {
            ctx.end_index();
        }
        ctx.end_document();

        self.state = match result {
            Ok(()) => NavigatorState::Done,
            Err(_) => NavigatorState::Failed,
        };
        result
    }

    /// Classify, then parse with the built-in profile for the detected kind
    pub fn extract(&mut self, sink: &mut dyn Sink) -> Result<DocumentKind> {
        let kind = match self.classify() {
            Ok(kind) => kind,
            Err(err) => {
                sink.begin_document();
                sink.end_document();
                return Err(err);
            },
        };
        self.parse(Profile::for_kind(kind), sink)?;
        Ok(kind)
    }
}

/// Determine the kind of `container`
pub fn classify(container: &Container) -> Result<DocumentKind> {
    Navigator::new(container, &ParseOptions::default()).classify()
}

/// Parse `container` as a document of `kind`
pub fn parse(
    container: &Container,
    kind: DocumentKind,
    sink: &mut dyn Sink,
    options: &ParseOptions,
) -> Result<()> {
    parse_with_profile(container, Profile::for_kind(kind), sink, options)
}

/// Parse `container` with a caller-supplied profile
pub fn parse_with_profile(
    container: &Container,
    profile: &Profile,
    sink: &mut dyn Sink,
    options: &ParseOptions,
) -> Result<()> {
    Navigator::new(container, options).parse(profile, sink)
}

/// Classify `container`, then parse it
pub fn extract(
    container: &Container,
    sink: &mut dyn Sink,
    options: &ParseOptions,
) -> Result<DocumentKind> {
    Navigator::new(container, options).extract(sink)
}

/// Open the document at `path` and collect its text and metadata
pub fn extract_path<P: AsRef<Path>>(path: P) -> Result<ExtractedDocument> {
    let container = Container::open(path)?;
    let mut collector = TextCollector::new();
    extract(&container, &mut collector, &ParseOptions::default())?;
    Ok(collector.into_document())
}

/// Receiver of the index walk
trait IndexVisitor {
    /// The index archive was found; `document_name` names the document
    fn begin_index(&mut self, document_name: &str);

    fn accept_entry(&mut self, name: &str) -> bool;

    fn visit_entry(&mut self, name: &str, reader: &mut dyn Read) -> Result<ControlFlow<()>>;

    fn skip_entry(&mut self, name: &str, reader: &mut dyn Read) -> Result<()>;
}

/// Read-only walk stopping at the first unambiguous type id
struct KindSniffer<'n> {
    options: &'n ParseOptions,
    state: &'n mut NavigatorState,
    kind: Option<DocumentKind>,
}

impl IndexVisitor for KindSniffer<'_> {
    fn begin_index(&mut self, _document_name: &str) {
        *self.state = NavigatorState::ClassifyingType;
    }

    fn accept_entry(&mut self, _name: &str) -> bool {
        true
    }

    fn visit_entry(&mut self, name: &str, reader: &mut dyn Read) -> Result<ControlFlow<()>> {
        let cancellation = self.options.cancellation();
        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match sniff_stream(reader, cancellation)? {
            Some(kind) => {
                log::debug!("{name} decides the kind");
                self.kind = Some(kind);
                Ok(ControlFlow::Break(()))
            },
            None => Ok(ControlFlow::Continue(())),
        }
    }

    fn skip_entry(&mut self, _name: &str, reader: &mut dyn Read) -> Result<()> {
        std::io::copy(reader, &mut std::io::sink())?;
        Ok(())
    }
}

/// Decoding walk feeding a [`Context`]
struct Dispatcher<'n, 'a> {
    ctx: &'n mut Context<'a>,
    options: &'n ParseOptions,
    state: &'n mut NavigatorState,
}

impl IndexVisitor for Dispatcher<'_, '_> {
    fn begin_index(&mut self, document_name: &str) {
        *self.state = NavigatorState::Dispatching;
        self.ctx.set_document_name(document_name);
        self.ctx.begin_index();
    }

    fn accept_entry(&mut self, name: &str) -> bool {
        self.ctx.accept_file(name)
    }

    fn visit_entry(&mut self, name: &str, reader: &mut dyn Read) -> Result<ControlFlow<()>> {
        self.ctx.begin_file(name);
        let completion = decode_stream(reader, self.ctx, self.options);
        self.ctx.end_file(name);
        finished(completion?)?;
        Ok(ControlFlow::Continue(()))
    }

    fn skip_entry(&mut self, name: &str, reader: &mut dyn Read) -> Result<()> {
        self.ctx.skip_file(name, reader)
    }
}

fn walk_container<V: IndexVisitor>(container: &Container, visitor: &mut V) -> Result<()> {
    match &container.source {
        Source::IndexArchive(bytes) => walk_index_archive(bytes, &container.name, visitor),
        Source::Composite(bytes) => walk_composite(bytes, &container.name, visitor),
    }
}

/// `<dir>` when `name` is `<dir>/Index.zip` with no other `/` before it
fn nested_index_dir(name: &str) -> Option<&str> {
    let slash = name.find('/')?;
    (&name[slash + 1..] == INDEX_ARCHIVE).then(|| &name[..slash])
}

/// Walk a single-file document
///
/// The first entry deciding the shape wins: a nested index archive is
/// walked on its own, otherwise `Index/` entries are walked in place.
fn walk_composite<V: IndexVisitor>(
    bytes: &[u8],
    document_name: &str,
    visitor: &mut V,
) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut unpacked = false;
    let mut content_entries = 0usize;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();

        if !unpacked {
            if let Some(dir) = nested_index_dir(&name) {
                log::debug!("found nested index archive {name}");
                let mut index = Vec::with_capacity(entry.size().min(1 << 24) as usize);
                entry.read_to_end(&mut index)?;
                return walk_index_archive(&index, dir, visitor);
            }
        }

        if name.starts_with(INDEX_DIR) {
            if !unpacked {
                log::debug!("found unpacked index in {document_name}");
                visitor.begin_index(document_name);
                unpacked = true;
            }
            if visit(visitor, &name, &mut entry, &mut content_entries)?.is_break() {
                return Ok(());
            }
        }
    }

    if !unpacked {
        return Err(Error::ContainerNotFound(format!(
            "{document_name} has neither {INDEX_ARCHIVE} nor {INDEX_DIR}"
        )));
    }
    if content_entries == 0 {
        return Err(Error::EmptyContainer(document_name.to_string()));
    }
    Ok(())
}

/// Walk the entries of an index archive
fn walk_index_archive<V: IndexVisitor>(
    bytes: &[u8],
    document_name: &str,
    visitor: &mut V,
) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    visitor.begin_index(document_name);

    let mut content_entries = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if visit(visitor, &name, &mut entry, &mut content_entries)?.is_break() {
            return Ok(());
        }
    }

    if content_entries == 0 {
        return Err(Error::EmptyContainer(format!(
            "{document_name}: no {CONTENT_SUFFIX} entries"
        )));
    }
    Ok(())
}

fn visit<V: IndexVisitor>(
    visitor: &mut V,
    name: &str,
    reader: &mut dyn Read,
    content_entries: &mut usize,
) -> Result<ControlFlow<()>> {
    if !name.ends_with(CONTENT_SUFFIX) {
        visitor.skip_entry(name, reader)?;
        return Ok(ControlFlow::Continue(()));
    }

    *content_entries += 1;
    if visitor.accept_entry(name) {
        visitor.visit_entry(name, reader)
    } else {
        log::debug!("declined {name}");
        visitor.skip_entry(name, reader)?;
        Ok(ControlFlow::Continue(()))
    }
}
