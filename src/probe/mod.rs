//! Collaborator seams for the discovery engine.
//!
//! The engine itself owns no network code. It drives two independent
//! metadata sources through the traits in this module:
//!
//! - [`DirectProbe`]: a cheap local/heuristic check that treats the URL
//!   as a possible feed address directly.
//! - [`RemoteDiscovery`]: a remote authoritative service that validates
//!   and enriches feed metadata independently.
//!
//! Two auxiliary seams complete the picture: [`Connectivity`] reports
//! whether the remote service is worth calling at all, and
//! [`ExclusionFilter`] lets an embedder veto URLs before any probing.
//!
//! All async trait methods return boxed futures so implementations can
//! live behind `Arc<dyn ...>` trait objects.

mod connectivity;
mod filter;
mod types;

pub use connectivity::{Connectivity, SharedConnectivity};
pub use filter::{ExclusionFilter, RegexExclusionFilter};
pub use types::{
    DirectProbe, ProbeError, RemoteDiscovery, RemoteServiceError, ServiceReply, ServiceStatus,
};

#[cfg(test)]
pub use types::tests::{MockDirectProbe, MockRemoteDiscovery};
