//! High-level facade over the discovery engine.
//!
//! Combines the results cache and the schedule coordinator behind a
//! lookup-or-discover API, following the same wiring-constructor
//! pattern as the rest of the crate: the facade builds and owns its
//! components, callers only see records and listener events.
//!
//! # Example
//!
//! ```ignore
//! use feedscout::service::FeedDiscoveryService;
//! use feedscout::discovery::CoordinatorConfig;
//!
//! let service = FeedDiscoveryService::new(
//!     direct_probe,
//!     remote_service,
//!     connectivity,
//!     CoordinatorConfig::default(),
//! );
//!
//! // Returns immediately; the record fills in as discovery runs.
//! let record = service.lookup_or_discover("http://example.com/")?;
//! while !record.is_complete() {
//!     // poll, or register a listener instead
//! }
//! ```

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::cache::ResultsCache;
use crate::discovery::{
    CoordinatorConfig, DiscoveryListener, DiscoveryResolver, ScheduleCoordinator, ScheduleError,
};
use crate::probe::{Connectivity, DirectProbe, RemoteDiscovery};
use crate::record::FeedRecord;

/// Facade combining the results cache and the schedule coordinator.
pub struct FeedDiscoveryService {
    cache: ResultsCache,
    coordinator: ScheduleCoordinator,
}

impl FeedDiscoveryService {
    /// Wires up a discovery service over the given collaborators.
    ///
    /// Must be called inside a tokio runtime; the coordinator spawns
    /// background tasks. The exclusion filter, concurrency cap and
    /// retry delay come from `config`.
    pub fn new(
        direct: Arc<dyn DirectProbe>,
        remote: Arc<dyn RemoteDiscovery>,
        connectivity: Arc<dyn Connectivity>,
        config: CoordinatorConfig,
    ) -> Self {
        let mut resolver = DiscoveryResolver::new(direct, remote);
        if let Some(filter) = config.exclusion_filter.clone() {
            resolver = resolver.with_exclusion_filter(filter);
        }
        let coordinator = ScheduleCoordinator::new(resolver, connectivity, config);
        Self {
            cache: ResultsCache::new(),
            coordinator,
        }
    }

    /// Parses a caller-supplied URL into the canonical form used as
    /// the cache key.
    ///
    /// Cache and dedup set must agree on one key per URL, so every
    /// cache operation goes through the same normalization the
    /// coordinator applies; alias spellings (missing trailing slash,
    /// host case, default port) converge on one record instance.
    fn canonical(url: &str) -> Result<Url, ScheduleError> {
        url.parse().map_err(|source| ScheduleError::InvalidUrl {
            url: url.to_string(),
            source,
        })
    }

    /// Returns the cached record for `url`, or creates an empty one,
    /// caches it, and schedules discovery for it.
    ///
    /// Unparsable URLs are rejected before anything is cached. The
    /// returned record is initially empty in the discovery case;
    /// callers observe progress via listener events or by polling
    /// [`FeedRecord::is_complete`].
    pub fn lookup_or_discover(&self, url: &str) -> Result<Arc<FeedRecord>, ScheduleError> {
        let parsed = Self::canonical(url)?;
        let key = parsed.as_str();
        if let Some(record) = self.cache.lookup(key) {
            return Ok(record);
        }

        debug!(url = key, "no cached metadata, starting discovery");
        // First-writer-wins: a racing call may have inserted its own
        // record; whichever is indexed is the one we schedule and hand
        // back.
        let record = self.cache.record(FeedRecord::new(), key);
        self.coordinator.schedule_discovery(Some(key), &record)?;
        Ok(record)
    }

    /// Returns the cached record for `url`, if any. Pure read; an
    /// unparsable URL has no entry.
    pub fn lookup(&self, url: &str) -> Option<Arc<FeedRecord>> {
        let parsed: Url = url.parse().ok()?;
        self.cache.lookup(parsed.as_str())
    }

    /// Returns all distinct completed records with a `Valid` verdict.
    pub fn lookup_valid(&self) -> Vec<Arc<FeedRecord>> {
        self.cache.lookup_valid()
    }

    /// Ensures `record` is cache-indexed and re-triggers scheduling
    /// for `url`.
    ///
    /// Indexing is a no-op when the record is already present under
    /// some key; scheduling coalesces when the URL is already in
    /// flight.
    pub fn update(&self, record: &Arc<FeedRecord>, url: &str) -> Result<(), ScheduleError> {
        let parsed = Self::canonical(url)?;
        let key = parsed.as_str();
        let indexed = if self.cache.contains(record) {
            Arc::clone(record)
        } else {
            self.cache.record(Arc::clone(record), key)
        };
        self.coordinator.schedule_discovery(Some(key), &indexed)
    }

    /// Removes the given records from the cache, all aliases included.
    pub fn forget(&self, records: &[Arc<FeedRecord>]) {
        self.cache.forget(records);
    }

    /// Registers a discovery listener.
    pub fn add_listener(&self, listener: Arc<dyn DiscoveryListener>) {
        self.coordinator.add_listener(listener);
    }

    /// Access to the coordinator, for scheduling with explicit URLs or
    /// reading stats.
    pub fn coordinator(&self) -> &ScheduleCoordinator {
        &self.coordinator
    }

    /// Shuts down the underlying coordinator.
    pub fn shutdown(&self) {
        self.coordinator.shutdown();
    }
}
