//! Probe traits and fault taxonomies.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use url::Url;

/// Boxed future type used by the dyn-safe probe traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// =============================================================================
// Direct probe
// =============================================================================

/// Faults the direct probe can raise.
///
/// The first five variants are *classifiable*: the probe has reached the
/// target and determined that this URL will never resolve through the
/// direct path. They exhaust the direct source for the URL but say
/// nothing about overall validity (the remote service may still
/// succeed). `Transient` covers everything else and causes the direct
/// probe to be retried on the next attempt.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The target resource does not exist.
    #[error("resource not found")]
    NotFound,
    /// The host could not be resolved.
    #[error("unknown host")]
    UnknownHost,
    /// Redirects looped back on themselves.
    #[error("cyclic redirection")]
    CyclicRedirect,
    /// The target requires credentials the probe does not have.
    #[error("not authenticated")]
    NotAuthenticated,
    /// The target exists but is not parsable as XML.
    #[error("content not parsable as XML")]
    UnparsableXml,
    /// Anything else: timeouts, connection resets, I/O oddities.
    #[error("transient probe failure: {0}")]
    Transient(String),
}

impl ProbeError {
    /// Returns true if this fault exhausts the direct source for the
    /// URL (no point retrying the direct probe).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProbeError::Transient(_))
    }
}

/// Local heuristic feed check.
///
/// `probe` treats the URL as a possible feed address directly and, on
/// success, returns the resolved feed link — which may differ from the
/// input when the target is an HTML page advertising its feed. A
/// successful probe with `None` means the probe ran to completion but
/// found no feed link.
pub trait DirectProbe: Send + Sync {
    /// Probes `url` for a feed, returning the resolved feed link if any.
    fn probe<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Option<Url>, ProbeError>>;
}

// =============================================================================
// Remote discovery service
// =============================================================================

/// Status code returned by the remote discovery service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    /// The service is still working on this URL; ask again later.
    Processing,
    /// The service confirmed the URL identifies a feed.
    Valid,
    /// The service determined the URL does not identify a feed.
    Invalid,
    /// A status code this client does not understand.
    Unrecognized(i32),
}

/// Reply from the remote discovery service.
///
/// Optional fields are only meaningful when `status` is
/// [`ServiceStatus::Valid`].
#[derive(Debug, Clone, Default)]
pub struct ServiceReply {
    /// Verdict for the queried URL.
    pub status: ServiceStatus,
    /// Number of inbound links the service knows about.
    pub inbound_links: Option<u32>,
    /// Feed title.
    pub title: Option<String>,
    /// Feed author.
    pub author: Option<String>,
    /// Feed description.
    pub description: Option<String>,
    /// Site address.
    pub html_url: Option<Url>,
    /// Feed address as the service resolved it.
    pub xml_url: Option<Url>,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        ServiceStatus::Processing
    }
}

impl ServiceReply {
    /// Convenience constructor for a bare status with no fields.
    pub fn status(status: ServiceStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

/// Error from the remote discovery service.
///
/// Both variants mean "no verdict this round": the resolver leaves the
/// service-source flag unset and the attempt is retried later.
#[derive(Debug, Clone, Error)]
pub enum RemoteServiceError {
    /// The service could not be reached at all.
    #[error("discovery service unreachable: {0}")]
    Unreachable(String),
    /// The service was reached but returned an error.
    #[error("discovery service error: {0}")]
    Service(String),
}

/// Remote authoritative discovery service.
pub trait RemoteDiscovery: Send + Sync {
    /// Asks the service about `url`, returning its verdict and any
    /// metadata it has gathered.
    fn discover<'a>(&'a self, url: &'a str)
        -> BoxFuture<'a, Result<ServiceReply, RemoteServiceError>>;
}

// =============================================================================
// Test mocks
// =============================================================================

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted direct probe: pops one outcome per call, repeating the
    /// last outcome once the script is exhausted.
    pub struct MockDirectProbe {
        outcomes: Mutex<Vec<Result<Option<Url>, ProbeError>>>,
        pub calls: AtomicUsize,
    }

    impl MockDirectProbe {
        pub fn new(outcomes: Vec<Result<Option<Url>, ProbeError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn always(outcome: Result<Option<Url>, ProbeError>) -> Self {
            Self::new(vec![outcome])
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DirectProbe for MockDirectProbe {
        fn probe<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Result<Option<Url>, ProbeError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut outcomes = self.outcomes.lock().unwrap();
            let outcome = if outcomes.len() > 1 {
                outcomes.remove(0)
            } else {
                outcomes[0].clone()
            };
            Box::pin(async move { outcome })
        }
    }

    /// Scripted remote service with the same pop-one-per-call behavior.
    pub struct MockRemoteDiscovery {
        replies: Mutex<Vec<Result<ServiceReply, RemoteServiceError>>>,
        pub calls: AtomicUsize,
    }

    impl MockRemoteDiscovery {
        pub fn new(replies: Vec<Result<ServiceReply, RemoteServiceError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn always(reply: Result<ServiceReply, RemoteServiceError>) -> Self {
            Self::new(vec![reply])
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RemoteDiscovery for MockRemoteDiscovery {
        fn discover<'a>(
            &'a self,
            _url: &'a str,
        ) -> BoxFuture<'a, Result<ServiceReply, RemoteServiceError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut replies = self.replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.remove(0)
            } else {
                replies[0].clone()
            };
            Box::pin(async move { reply })
        }
    }

    #[test]
    fn classifiable_faults_are_terminal() {
        assert!(ProbeError::NotFound.is_terminal());
        assert!(ProbeError::UnknownHost.is_terminal());
        assert!(ProbeError::CyclicRedirect.is_terminal());
        assert!(ProbeError::NotAuthenticated.is_terminal());
        assert!(ProbeError::UnparsableXml.is_terminal());
        assert!(!ProbeError::Transient("timeout".into()).is_terminal());
    }
}
