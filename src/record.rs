//! Feed metadata records and the validity state machine.
//!
//! A [`FeedRecord`] is the mutable object progressively filled in by
//! discovery. Records are shared (`Arc<FeedRecord>`) between the cache,
//! the retry chain that fills them, and whoever asked for them; all
//! field access goes through an internal mutex. Record identity (for
//! cache eviction and listener bookkeeping) is `Arc` pointer identity,
//! never field equality.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use url::Url;

/// Verdict on whether a URL identifies a valid feed.
///
/// Starts as `Unknown` and is driven to `Valid` or `Invalid` by the
/// discovery sources. `Valid` is sticky for the session: a later
/// `Invalid` verdict from another source never overwrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Neither source has produced a verdict yet.
    Unknown,
    /// At least one source confirmed this is a feed.
    Valid,
    /// A source determined this is not a feed.
    Invalid,
}

impl Validity {
    /// Returns true if a definitive verdict (either way) exists.
    pub fn is_decided(self) -> bool {
        !matches!(self, Validity::Unknown)
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validity::Unknown => write!(f, "unknown"),
            Validity::Valid => write!(f, "valid"),
            Validity::Invalid => write!(f, "invalid"),
        }
    }
}

/// Metadata snapshot for a feed record.
///
/// This is the plain-data view of a [`FeedRecord`], returned by
/// [`FeedRecord::snapshot`] so callers can read a consistent set of
/// fields without holding the record lock.
#[derive(Debug, Clone, Default)]
pub struct FeedMetadata {
    /// Resolved feed (XML) address. Non-`None` whenever `validity` is
    /// `Valid`.
    pub xml_url: Option<Url>,
    /// Address of the human-readable site the feed belongs to.
    pub html_url: Option<Url>,
    /// Feed title.
    pub title: Option<String>,
    /// Feed author.
    pub author: Option<String>,
    /// Feed description.
    pub description: Option<String>,
    /// Number of inbound links reported by the remote service.
    pub inbound_links: Option<u32>,
    /// Validity verdict.
    pub validity: Validity,
    /// Whether discovery is considered finished for this record.
    pub complete: bool,
    /// Set when `complete` transitions to true; wall-clock time.
    pub last_update: Option<SystemTime>,
}

impl Default for Validity {
    fn default() -> Self {
        Validity::Unknown
    }
}

/// Shared, progressively-filled feed metadata record.
///
/// Created empty by the facade (or a caller), handed to the scheduler,
/// and mutated in place by the resolver across retry attempts. Callers
/// observe progress by polling [`is_complete`](Self::is_complete) or by
/// registering a discovery listener.
#[derive(Debug, Default)]
pub struct FeedRecord {
    inner: Mutex<FeedMetadata>,
}

impl FeedRecord {
    /// Creates a new empty record with `Unknown` validity.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a record that already knows its feed address.
    pub fn with_xml_url(xml_url: Url) -> Arc<Self> {
        let record = Self::default();
        record.lock().xml_url = Some(xml_url);
        Arc::new(record)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FeedMetadata> {
        // A poisoned record lock means a panic mid-mutation; the panic
        // itself is surfaced at the worker boundary, so readers take
        // the last written state.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a consistent copy of all fields.
    pub fn snapshot(&self) -> FeedMetadata {
        self.lock().clone()
    }

    /// Returns the resolved feed address, if any.
    pub fn xml_url(&self) -> Option<Url> {
        self.lock().xml_url.clone()
    }

    /// Returns the site address, if any.
    pub fn html_url(&self) -> Option<Url> {
        self.lock().html_url.clone()
    }

    /// Returns the feed title, if any.
    pub fn title(&self) -> Option<String> {
        self.lock().title.clone()
    }

    /// Returns the current validity verdict.
    pub fn validity(&self) -> Validity {
        self.lock().validity
    }

    /// Returns true if discovery is finished for this record.
    pub fn is_complete(&self) -> bool {
        self.lock().complete
    }

    /// Returns the completion timestamp, if the record ever completed.
    pub fn last_update(&self) -> Option<SystemTime> {
        self.lock().last_update
    }

    /// Applies a mutation to the record under its lock.
    ///
    /// This is the only write path; the resolver uses it so that each
    /// step of an attempt is atomic with respect to readers.
    pub fn update<R>(&self, f: impl FnOnce(&mut FeedMetadata) -> R) -> R {
        f(&mut self.lock())
    }

    /// Marks the record incomplete. Called at the start of every
    /// discovery attempt before the flags are recomputed.
    pub(crate) fn reset_complete(&self) {
        self.lock().complete = false;
    }

    /// Marks the record complete and stamps `last_update`.
    pub(crate) fn mark_complete(&self) {
        let mut inner = self.lock();
        inner.complete = true;
        inner.last_update = Some(SystemTime::now());
    }
}

/// Returns true if two record handles refer to the same record.
pub fn same_record(a: &Arc<FeedRecord>, b: &Arc<FeedRecord>) -> bool {
    Arc::ptr_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_unknown_and_incomplete() {
        let record = FeedRecord::new();
        assert_eq!(record.validity(), Validity::Unknown);
        assert!(!record.is_complete());
        assert!(record.xml_url().is_none());
        assert!(record.last_update().is_none());
    }

    #[test]
    fn mark_complete_stamps_last_update() {
        let record = FeedRecord::new();
        record.mark_complete();
        assert!(record.is_complete());
        assert!(record.last_update().is_some());
    }

    #[test]
    fn reset_complete_preserves_last_update() {
        let record = FeedRecord::new();
        record.mark_complete();
        let stamp = record.last_update();
        record.reset_complete();
        assert!(!record.is_complete());
        assert_eq!(record.last_update(), stamp);
    }

    #[test]
    fn update_mutates_under_lock() {
        let record = FeedRecord::new();
        record.update(|m| {
            m.title = Some("Example".to_string());
            m.validity = Validity::Valid;
        });
        assert_eq!(record.title().as_deref(), Some("Example"));
        assert_eq!(record.validity(), Validity::Valid);
    }

    #[test]
    fn identity_is_pointer_equality() {
        let a = FeedRecord::new();
        let b = FeedRecord::new();
        let a2 = Arc::clone(&a);
        assert!(same_record(&a, &a2));
        assert!(!same_record(&a, &b));
    }
}
