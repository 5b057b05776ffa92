//! Two-source resolution of one discovery attempt.
//!
//! The resolver runs a single attempt for a URL: it applies the
//! exclusion filter, consults the direct probe and/or the remote
//! service, merges whatever they produced into the record, and
//! recomputes the record's completeness. Expected outcomes — probe
//! faults, service errors, "still processing" — are absorbed into the
//! request's completion flags and never surface as errors; only genuine
//! bugs (panics) escape, and those are handled at the worker boundary
//! in the coordinator.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::probe::{
    DirectProbe, ExclusionFilter, RemoteDiscovery, ServiceReply, ServiceStatus,
};
use crate::record::Validity;

use super::request::DiscoveryRequest;

/// Runs discovery attempts against the two metadata sources.
pub struct DiscoveryResolver {
    direct: Arc<dyn DirectProbe>,
    service: Arc<dyn RemoteDiscovery>,
    exclusion_filter: Option<Arc<dyn ExclusionFilter>>,
}

impl DiscoveryResolver {
    /// Creates a resolver over the given sources.
    pub fn new(direct: Arc<dyn DirectProbe>, service: Arc<dyn RemoteDiscovery>) -> Self {
        Self {
            direct,
            service,
            exclusion_filter: None,
        }
    }

    /// Sets the exclusion filter.
    pub fn with_exclusion_filter(mut self, filter: Arc<dyn ExclusionFilter>) -> Self {
        self.exclusion_filter = Some(filter);
        self
    }

    /// Runs one discovery attempt, mutating the request's record and
    /// completion flags in place.
    ///
    /// `service_reachable` gates the service probe for this round; when
    /// false the service flag stays unset and the coordinator retries
    /// later.
    pub async fn resolve(&self, request: &mut DiscoveryRequest, service_reachable: bool) {
        // Completeness is recomputed from scratch every attempt.
        request.record().reset_complete();

        if self.is_excluded(request) {
            debug!(url = %request.url(), "URL excluded by filter, terminating discovery");
            request.record().update(|m| m.validity = Validity::Invalid);
            request.mark_direct_done();
            request.mark_service_done();
        } else {
            self.run_direct_probe(request).await;
            if service_reachable && !request.is_local() {
                self.run_service_probe(request).await;
            }
        }

        self.recompute_completeness(request);
    }

    fn is_excluded(&self, request: &DiscoveryRequest) -> bool {
        self.exclusion_filter
            .as_ref()
            .is_some_and(|filter| filter.matches(request.url()))
    }

    /// Direct-source pass: treat the URL as a possible feed address.
    ///
    /// Skipped once the source is exhausted or the record already has a
    /// resolved feed address.
    async fn run_direct_probe(&self, request: &mut DiscoveryRequest) {
        if request.direct_done() || request.record().xml_url().is_some() {
            return;
        }

        match self.direct.probe(request.url()).await {
            Ok(Some(link)) => {
                debug!(url = %request.url(), feed = %link, "direct probe resolved feed link");
                request.record().update(|m| {
                    m.xml_url = Some(link);
                    m.validity = Validity::Valid;
                });
                request.mark_direct_done();
            }
            Ok(None) => {
                // Probe ran to completion but found nothing; the direct
                // source has nothing more to offer for this URL.
                debug!(url = %request.url(), "direct probe found no feed link");
                request.mark_direct_done();
            }
            Err(fault) if fault.is_terminal() => {
                // Terminal for the direct source only: says nothing
                // about validity, the service may still succeed.
                debug!(url = %request.url(), %fault, "direct probe fault, source exhausted");
                request.mark_direct_done();
            }
            Err(fault) => {
                debug!(url = %request.url(), %fault, "transient direct probe failure, will retry");
            }
        }
    }

    /// Service-source pass: ask the remote authority about the URL.
    async fn run_service_probe(&self, request: &mut DiscoveryRequest) {
        if request.service_done() {
            return;
        }

        let reply = match self.service.discover(request.url().as_str()).await {
            Ok(reply) => reply,
            Err(err) => {
                // No verdict this round; the flag stays unset and the
                // coordinator retries on schedule.
                debug!(url = %request.url(), %err, "discovery service gave no verdict");
                return;
            }
        };

        match reply.status {
            ServiceStatus::Processing => {
                debug!(url = %request.url(), "discovery service still processing");
            }
            ServiceStatus::Valid => {
                self.merge_service_reply(request, reply);
                request.mark_service_done();
            }
            ServiceStatus::Invalid => {
                request.record().update(|m| {
                    // A prior Valid verdict is never overwritten.
                    if m.validity == Validity::Unknown {
                        m.validity = Validity::Invalid;
                    }
                });
                request.mark_service_done();
            }
            ServiceStatus::Unrecognized(code) => {
                warn!(url = %request.url(), code, "unrecognized discovery service status");
            }
        }
    }

    /// Merges a `Valid` service reply into the record.
    ///
    /// Descriptive fields are overwritten; the two URL fields keep their
    /// first resolved value, so the direct probe takes priority over the
    /// service for the feed address.
    fn merge_service_reply(&self, request: &DiscoveryRequest, reply: ServiceReply) {
        request.record().update(|m| {
            m.inbound_links = reply.inbound_links;
            m.title = reply.title;
            m.author = reply.author;
            m.description = reply.description;
            if m.html_url.is_none() {
                m.html_url = reply.html_url;
            }
            if m.xml_url.is_none() {
                m.xml_url = reply.xml_url;
            }
            m.validity = Validity::Valid;
        });
    }

    /// Recomputes the record's completeness from the verdict and the
    /// per-source flags.
    ///
    /// - `Valid`: one source suffices.
    /// - `Invalid`: both sources must have weighed in.
    /// - `Unknown`: only a local URL can complete without a verdict,
    ///   since the direct source is authoritative for it.
    fn recompute_completeness(&self, request: &DiscoveryRequest) {
        let complete = match request.record().validity() {
            Validity::Valid => request.direct_done() || request.service_done(),
            Validity::Invalid => request.direct_done() && request.service_done(),
            Validity::Unknown => request.is_local() && request.direct_done(),
        };
        if complete {
            request.record().mark_complete();
        }
    }
}
