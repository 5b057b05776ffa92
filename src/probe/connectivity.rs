//! Service reachability state.

use tokio::sync::watch;
use tracing::info;

/// Reports whether the remote discovery service is worth calling.
///
/// The coordinator samples this once per attempt; when unreachable, the
/// service probe is skipped for that round and the attempt is retried
/// on the normal schedule, so discovery resumes by itself once
/// reachability returns.
pub trait Connectivity: Send + Sync {
    /// Returns true if the remote service is currently reachable.
    fn is_reachable(&self) -> bool;
}

/// Watch-channel backed connectivity state.
///
/// The owning side flips reachability with [`set_reachable`]; any number
/// of observers can either sample it through the [`Connectivity`] trait
/// or await changes on a subscribed receiver.
///
/// [`set_reachable`]: SharedConnectivity::set_reachable
pub struct SharedConnectivity {
    tx: watch::Sender<bool>,
}

impl SharedConnectivity {
    /// Creates a connectivity state with the given initial reachability.
    pub fn new(reachable: bool) -> Self {
        let (tx, _) = watch::channel(reachable);
        Self { tx }
    }

    /// Updates reachability, waking any subscribed observers.
    pub fn set_reachable(&self, reachable: bool) {
        if self.tx.send_replace(reachable) != reachable {
            info!(reachable, "discovery service reachability changed");
        }
    }

    /// Subscribes to reachability changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for SharedConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connectivity for SharedConnectivity {
    fn is_reachable(&self) -> bool {
        *self.tx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reachability_flips_are_observable() {
        let connectivity = SharedConnectivity::new(false);
        assert!(!connectivity.is_reachable());

        connectivity.set_reachable(true);
        assert!(connectivity.is_reachable());
    }

    #[tokio::test]
    async fn subscribers_are_notified_of_changes() {
        let connectivity = SharedConnectivity::new(false);
        let mut rx = connectivity.subscribe();

        connectivity.set_reachable(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
