//! Parse configuration: cancellation and malformed-record handling

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::iwa::{ArchiveInfo, Error, MessageInfo};

/// Cooperative cancellation flag shared between a parse and its caller
///
/// The record decoder checks the flag once per record group. Clones share
/// the same flag, so a clone can be moved to another thread and cancelled
/// from there.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// What to do with a record whose body failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Drop the record and continue with the next one
    Skip,
    /// Fail the whole parse with the decode error
    Abort,
}

/// Hook deciding the fate of malformed records
pub trait MalformedRecordPolicy: Send + Sync {
    fn on_malformed(
        &self,
        file: Option<&str>,
        archive_info: &ArchiveInfo,
        message_info: &MessageInfo,
        error: &Error,
    ) -> Disposition;
}

/// Treats every malformed record as fatal
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnMalformed;

impl MalformedRecordPolicy for AbortOnMalformed {
    fn on_malformed(
        &self,
        _file: Option<&str>,
        _archive_info: &ArchiveInfo,
        _message_info: &MessageInfo,
        _error: &Error,
    ) -> Disposition {
        Disposition::Abort
    }
}

/// Logs and skips malformed records
///
/// Useful for documents written by third-party tools that encode some
/// record types unreliably. When `only_types` is non-empty, malformed
/// records of other types still abort.
#[derive(Debug, Clone, Default)]
pub struct SkipMalformed {
    only_types: Vec<u32>,
}

impl SkipMalformed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict skipping to the given message types
    pub fn only_types(mut self, types: &[u32]) -> Self {
        self.only_types = types.to_vec();
        self
    }
}

impl MalformedRecordPolicy for SkipMalformed {
    fn on_malformed(
        &self,
        file: Option<&str>,
        archive_info: &ArchiveInfo,
        message_info: &MessageInfo,
        error: &Error,
    ) -> Disposition {
        if !self.only_types.is_empty() && !self.only_types.contains(&message_info.r#type) {
            return Disposition::Abort;
        }
        log::warn!(
            "Skipping malformed record of type {} (identifier {:?}) in {}: {}",
            message_info.r#type,
            archive_info.identifier,
            file.unwrap_or("<unknown>"),
            error
        );
        Disposition::Skip
    }
}

/// Options controlling a single parse
#[derive(Clone)]
pub struct ParseOptions {
    cancellation: CancellationToken,
    malformed_policy: Arc<dyn MalformedRecordPolicy>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `token` to stop the parse from outside
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Replace the malformed-record policy
    pub fn with_malformed_policy<P: MalformedRecordPolicy + 'static>(mut self, policy: P) -> Self {
        self.malformed_policy = Arc::new(policy);
        self
    }

    /// Skip every malformed record instead of aborting
    pub fn skip_malformed(self) -> Self {
        self.with_malformed_policy(SkipMalformed::new())
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn malformed_policy(&self) -> &dyn MalformedRecordPolicy {
        self.malformed_policy.as_ref()
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            malformed_policy: Arc::new(AbortOnMalformed),
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("cancellation", &self.cancellation)
            .finish_non_exhaustive()
    }
}
