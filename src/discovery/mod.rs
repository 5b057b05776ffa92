//! The discovery engine: scheduling, resolution, and events.
//!
//! Given a URL suspected of identifying a web feed, the engine
//! determines asynchronously whether it is a valid feed and enriches it
//! with metadata from two independent sources — a cheap direct probe
//! and an authoritative remote service — retrying on a fixed schedule
//! until a definitive answer is reached. A URL is never probed by more
//! than one concurrent pipeline.
//!
//! # Example
//!
//! ```ignore
//! use feedscout::discovery::{
//!     CoordinatorConfig, DiscoveryResolver, ScheduleCoordinator,
//! };
//! use feedscout::record::FeedRecord;
//!
//! let resolver = DiscoveryResolver::new(direct_probe, remote_service);
//! let coordinator =
//!     ScheduleCoordinator::new(resolver, connectivity, CoordinatorConfig::default());
//!
//! let record = FeedRecord::new();
//! coordinator.schedule_discovery(Some("http://example.com/"), &record)?;
//! ```

mod config;
mod coordinator;
mod error;
mod events;
mod request;
mod resolver;

pub use config::{
    scheme_allowed, CoordinatorConfig, ALLOWED_SCHEMES, DEFAULT_MAX_CONCURRENT,
    DEFAULT_RETRY_DELAY_SECS,
};
pub use coordinator::{CoordinatorStats, ScheduleCoordinator};
pub use error::ScheduleError;
pub use events::{DiscoveryEvent, DiscoveryListener};
pub use request::DiscoveryRequest;
pub use resolver::DiscoveryResolver;
