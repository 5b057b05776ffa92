//! feedscout - Asynchronous feed metadata discovery
//!
//! This library implements the metadata discovery engine of a feed
//! reader: given a URL suspected of identifying a web feed, it
//! determines asynchronously whether the URL is a valid feed and
//! enriches it with metadata from two independent sources (a cheap
//! direct probe and an authoritative remote service), retrying on a
//! fixed schedule until a definitive answer is reached. No URL is ever
//! probed by more than one concurrent pipeline.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
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
//! // Returns immediately with an empty record; discovery fills it in.
//! let record = service.lookup_or_discover("http://example.com/")?;
//! ```
//!
//! The network-facing collaborators — the direct probe, the remote
//! discovery service, and connectivity state — are supplied by the
//! embedder through the traits in [`probe`].

pub mod cache;
pub mod discovery;
pub mod logging;
pub mod probe;
pub mod record;
pub mod service;

/// Version of the feedscout library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
