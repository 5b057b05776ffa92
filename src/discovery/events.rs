//! Discovery lifecycle events and the listener trait.

use std::sync::Arc;

/// Event emitted by the coordinator for one URL's discovery lifecycle.
///
/// Ordering guarantees per URL: `Started` fires before anything else,
/// `Finished` may fire once per attempt, and `Failed` is always the
/// last event — no attempts follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// The first attempt for a URL has begun. Retries do not re-fire
    /// this event.
    Started(String),
    /// An attempt finished; the flag is the record's completeness after
    /// the attempt. Fires even while retries continue.
    Finished(String, bool),
    /// An infrastructure fault permanently stopped discovery for the
    /// URL.
    Failed(String),
}

/// Callback interface for observing discovery progress.
///
/// Callbacks are serialized through a single event pump, but may fall
/// back to inline delivery during teardown — implementations must not
/// assume a particular calling thread.
pub trait DiscoveryListener: Send + Sync {
    /// Discovery began for `url`.
    fn started(&self, url: &str) {
        let _ = url;
    }

    /// An attempt for `url` finished; `complete` reflects the record.
    fn finished(&self, url: &str, complete: bool) {
        let _ = (url, complete);
    }

    /// Discovery for `url` failed permanently.
    fn failed(&self, url: &str) {
        let _ = url;
    }
}

/// Dispatches one event to one listener.
pub(crate) fn dispatch(listener: &Arc<dyn DiscoveryListener>, event: &DiscoveryEvent) {
    match event {
        DiscoveryEvent::Started(url) => listener.started(url),
        DiscoveryEvent::Finished(url, complete) => listener.finished(url, *complete),
        DiscoveryEvent::Failed(url) => listener.failed(url),
    }
}
