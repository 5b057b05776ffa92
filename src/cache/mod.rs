//! In-memory results cache for discovered feed metadata.
//!
//! The cache maps canonical URL strings to shared [`FeedRecord`]s. It is
//! session-scoped: nothing is persisted, and the cache is rebuilt from
//! scratch each run. The same record may be indexed under several URL
//! aliases, so reads that enumerate records deduplicate by identity.
//!
//! Insertion is first-writer-wins: two discovery paths racing to record
//! the same URL converge on a single record instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::record::{same_record, FeedRecord, Validity};

/// Thread-safe map from canonical URL to feed record.
#[derive(Debug, Default)]
pub struct ResultsCache {
    entries: Mutex<HashMap<String, Arc<FeedRecord>>>,
}

impl ResultsCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the record for a URL, if one has been recorded.
    pub fn lookup(&self, url: &str) -> Option<Arc<FeedRecord>> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
    }

    /// Records `record` under `url` unless the URL already has an entry.
    ///
    /// Returns the record that is actually indexed under the URL: the
    /// given one if it won the race, the pre-existing one otherwise.
    /// Re-recording is a no-op so concurrent discovery and lookup calls
    /// converge on one record instance per URL.
    pub fn record(&self, record: Arc<FeedRecord>, url: &str) -> Arc<FeedRecord> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(url.to_string())
            .or_insert_with(|| {
                debug!(url, "recording feed metadata entry");
                record
            })
            .clone()
    }

    /// Returns all distinct records that completed with a `Valid`
    /// verdict, deduplicated by record identity.
    pub fn lookup_valid(&self) -> Vec<Arc<FeedRecord>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut valid: Vec<Arc<FeedRecord>> = Vec::new();
        for record in entries.values() {
            if !record.is_complete() || record.validity() != Validity::Valid {
                continue;
            }
            if !valid.iter().any(|seen| same_record(seen, record)) {
                valid.push(Arc::clone(record));
            }
        }
        valid
    }

    /// Returns true if the record is indexed under any key.
    pub fn contains(&self, record: &Arc<FeedRecord>) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .any(|value| same_record(value, record))
    }

    /// Removes every entry whose value is one of the given records,
    /// regardless of the key it is indexed under.
    pub fn forget(&self, records: &[Arc<FeedRecord>]) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, value| !records.iter().any(|r| same_record(r, value)));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "evicted feed metadata entries");
        }
    }

    /// Returns the number of indexed entries (aliases counted).
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Returns true if no entries are indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_complete_record() -> Arc<FeedRecord> {
        let record = FeedRecord::new();
        record.update(|m| {
            m.xml_url = Some("http://example.com/feed.xml".parse().unwrap());
            m.validity = Validity::Valid;
        });
        record.mark_complete();
        record
    }

    #[test]
    fn lookup_of_unrecorded_url_is_none() {
        let cache = ResultsCache::new();
        assert!(cache.lookup("http://example.com/").is_none());
    }

    #[test]
    fn record_is_first_writer_wins() {
        let cache = ResultsCache::new();
        let first = FeedRecord::new();
        let second = FeedRecord::new();

        let winner = cache.record(Arc::clone(&first), "http://x/");
        assert!(same_record(&winner, &first));

        let winner = cache.record(Arc::clone(&second), "http://x/");
        assert!(same_record(&winner, &first));
        assert!(same_record(&cache.lookup("http://x/").unwrap(), &first));
    }

    #[test]
    fn lookup_valid_filters_and_deduplicates() {
        let cache = ResultsCache::new();

        let valid = valid_complete_record();
        cache.record(Arc::clone(&valid), "http://a/");
        cache.record(Arc::clone(&valid), "http://a/alias");

        let incomplete = FeedRecord::new();
        cache.record(incomplete, "http://b/");

        let invalid = FeedRecord::new();
        invalid.update(|m| m.validity = Validity::Invalid);
        invalid.mark_complete();
        cache.record(invalid, "http://c/");

        let results = cache.lookup_valid();
        assert_eq!(results.len(), 1);
        assert!(same_record(&results[0], &valid));
    }

    #[test]
    fn contains_checks_record_identity_across_keys() {
        let cache = ResultsCache::new();
        let record = FeedRecord::new();
        assert!(!cache.contains(&record));

        cache.record(Arc::clone(&record), "http://a/");
        assert!(cache.contains(&record));
        assert!(!cache.contains(&FeedRecord::new()));
    }

    #[test]
    fn forget_removes_all_aliases_of_a_record() {
        let cache = ResultsCache::new();
        let record = valid_complete_record();
        cache.record(Arc::clone(&record), "http://a/");
        cache.record(Arc::clone(&record), "http://a/alias");
        let other = valid_complete_record();
        cache.record(Arc::clone(&other), "http://b/");

        cache.forget(&[record]);
        assert!(cache.lookup("http://a/").is_none());
        assert!(cache.lookup("http://a/alias").is_none());
        assert!(cache.lookup("http://b/").is_some());
        assert_eq!(cache.len(), 1);
    }
}
