//! Per-URL discovery attempt state.

use std::sync::Arc;

use url::Url;

use crate::record::FeedRecord;

/// Mutable state for one URL's discovery retry chain.
///
/// Created once when a URL is first scheduled and reused across retry
/// attempts. The request is owned exclusively by its retry chain — the
/// coordinator's dedup set guarantees at most one in-flight attempt per
/// URL — so no internal locking is needed.
#[derive(Debug)]
pub struct DiscoveryRequest {
    /// The URL under discovery.
    url: Url,
    /// The record being filled in.
    record: Arc<FeedRecord>,
    /// Number of completed reschedules (0 on the first attempt).
    attempts: u32,
    /// True if the URL points at this machine (file scheme or loopback
    /// host). Local URLs never consult the remote service.
    local: bool,
    /// The direct source has been exhausted for this URL.
    direct_done: bool,
    /// The remote service has delivered a final answer for this URL.
    service_done: bool,
}

impl DiscoveryRequest {
    /// Creates the request for a URL's first discovery attempt.
    pub fn new(url: Url, record: Arc<FeedRecord>) -> Self {
        let local = is_local_url(&url);
        Self {
            url,
            record,
            attempts: 0,
            local,
            direct_done: false,
            service_done: false,
        }
    }

    /// The URL under discovery.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The record being filled in.
    pub fn record(&self) -> &Arc<FeedRecord> {
        &self.record
    }

    /// Number of reschedules so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// True if this is the first attempt for the URL.
    pub fn is_first_attempt(&self) -> bool {
        self.attempts == 0
    }

    /// True if the URL is local to this machine.
    pub fn is_local(&self) -> bool {
        self.local
    }

    /// True if the direct source is exhausted.
    pub fn direct_done(&self) -> bool {
        self.direct_done
    }

    /// True if the remote service has answered definitively.
    pub fn service_done(&self) -> bool {
        self.service_done
    }

    /// Marks the direct source exhausted. Monotonic: never reset.
    pub fn mark_direct_done(&mut self) {
        self.direct_done = true;
    }

    /// Marks the service source answered. Monotonic: never reset.
    pub fn mark_service_done(&mut self) {
        self.service_done = true;
    }

    /// Counts a reschedule. Called once per retry submission.
    pub fn count_attempt(&mut self) {
        self.attempts += 1;
    }
}

/// Returns true if the URL's scheme is a file scheme or its host is a
/// loopback address.
fn is_local_url(url: &Url) -> bool {
    if url.scheme() == "file" {
        return true;
    }
    match url.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
        Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_for(url: &str) -> DiscoveryRequest {
        DiscoveryRequest::new(url.parse().unwrap(), FeedRecord::new())
    }

    #[test]
    fn file_urls_are_local() {
        assert!(request_for("file:///home/user/feed.xml").is_local());
    }

    #[test]
    fn loopback_hosts_are_local() {
        assert!(request_for("http://localhost/feed").is_local());
        assert!(request_for("http://127.0.0.1/feed").is_local());
        assert!(request_for("http://[::1]/feed").is_local());
    }

    #[test]
    fn remote_hosts_are_not_local() {
        assert!(!request_for("http://example.com/feed").is_local());
        assert!(!request_for("http://192.168.1.10/feed").is_local());
    }

    #[test]
    fn new_request_has_no_progress() {
        let request = request_for("http://example.com/");
        assert!(request.is_first_attempt());
        assert!(!request.direct_done());
        assert!(!request.service_done());
    }

    #[test]
    fn attempt_counter_is_monotonic() {
        let mut request = request_for("http://example.com/");
        request.count_attempt();
        request.count_attempt();
        assert_eq!(request.attempts(), 2);
        assert!(!request.is_first_attempt());
    }
}
