//! Discovery scheduling: dedup, bounded concurrency, retries, events.
//!
//! The coordinator owns the in-flight dedup set, a semaphore bounding
//! concurrent discovery attempts, a retry timer per rescheduled URL,
//! and a single-task event pump that serializes listener callbacks.
//!
//! # Architecture
//!
//! ```text
//!  schedule_discovery(url)
//!          │
//!          ▼
//!   ┌─────────────┐   already in flight?   ─── yes ──► no-op
//!   │  dedup set   │
//!   └──────┬──────┘
//!          │ fresh insert
//!          ▼
//!   worker attempt ──► resolver ──► complete? ──┬── yes ──► unschedule
//!          ▲                                    │
//!          └──────── retry timer (15 s) ◄── no ─┘
//!
//!   events (Started / Finished / Failed) ──► pump task ──► listeners
//! ```
//!
//! Per-URL guarantees: at most one attempt in flight (the dedup set is
//! the gate), `Started` before anything else, `Failed` always last.
//! A panic escaping the resolver permanently unschedules the URL — a
//! deliberate fail-fast policy; transient outcomes are signaled through
//! the request's completion flags, never by unwinding.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashSet;
use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};
use url::Url;

use crate::probe::Connectivity;
use crate::record::FeedRecord;

use super::config::{scheme_allowed, CoordinatorConfig};
use super::error::ScheduleError;
use super::events::{dispatch, DiscoveryEvent, DiscoveryListener};
use super::request::DiscoveryRequest;
use super::resolver::DiscoveryResolver;

// =============================================================================
// Statistics
// =============================================================================

/// Snapshot of coordinator counters.
#[derive(Debug, Default, Clone)]
pub struct CoordinatorStats {
    /// Schedule calls that started a new retry chain.
    pub scheduled: u64,
    /// Schedule calls coalesced onto an in-flight chain.
    pub coalesced: u64,
    /// Attempts that ran to completion (any outcome).
    pub attempts: u64,
    /// Retry resubmissions.
    pub retries: u64,
    /// URLs permanently failed by an infrastructure fault.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    scheduled: AtomicU64,
    coalesced: AtomicU64,
    attempts: AtomicU64,
    retries: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> CoordinatorStats {
        CoordinatorStats {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Schedules discovery attempts with per-URL dedup and bounded
/// concurrency.
///
/// Must be created inside a tokio runtime: the constructor spawns the
/// event pump task, and scheduling spawns worker tasks.
pub struct ScheduleCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: Arc<DiscoveryResolver>,
    connectivity: Arc<dyn Connectivity>,
    config: CoordinatorConfig,
    /// URLs with an attempt executing or a retry pending. Membership is
    /// the sole gate for scheduling new work.
    in_flight: DashSet<String>,
    /// Caps concurrent resolver executions; a waiting retry holds no
    /// permit.
    permits: Arc<Semaphore>,
    listeners: Arc<Mutex<Vec<Arc<dyn DiscoveryListener>>>>,
    event_tx: mpsc::UnboundedSender<DiscoveryEvent>,
    shutdown: CancellationToken,
    counters: Counters,
}

impl ScheduleCoordinator {
    /// Creates a coordinator and spawns its event pump.
    pub fn new(
        resolver: DiscoveryResolver,
        connectivity: Arc<dyn Connectivity>,
        config: CoordinatorConfig,
    ) -> Self {
        let listeners: Arc<Mutex<Vec<Arc<dyn DiscoveryListener>>>> =
            Arc::new(Mutex::new(Vec::new()));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        tokio::spawn(run_event_pump(
            event_rx,
            Arc::clone(&listeners),
            shutdown.clone(),
        ));

        let inner = Arc::new(Inner {
            resolver: Arc::new(resolver),
            connectivity,
            permits: Arc::new(Semaphore::new(config.max_concurrent)),
            config,
            in_flight: DashSet::new(),
            listeners,
            event_tx,
            shutdown,
            counters: Counters::default(),
        });

        info!(
            max_concurrent = inner.config.max_concurrent,
            retry_delay = ?inner.config.retry_delay,
            "discovery coordinator started"
        );

        Self { inner }
    }

    /// Schedules discovery for a URL.
    ///
    /// Falls back to the record's feed address when `url` is `None`;
    /// errors when neither yields a usable URL. URLs with a scheme
    /// outside {http, https, file, ftp} are silently ignored. If the
    /// URL is already in flight the call coalesces onto the existing
    /// retry chain and nothing observable happens.
    pub fn schedule_discovery(
        &self,
        url: Option<&str>,
        record: &Arc<FeedRecord>,
    ) -> Result<(), ScheduleError> {
        let parsed: Url = match url {
            Some(raw) => raw
                .parse()
                .map_err(|source| ScheduleError::InvalidUrl {
                    url: raw.to_string(),
                    source,
                })?,
            None => record.xml_url().ok_or(ScheduleError::MissingUrl)?,
        };

        if !scheme_allowed(parsed.scheme()) {
            debug!(url = %parsed, scheme = parsed.scheme(), "scheme not discoverable, ignoring");
            return Ok(());
        }

        let key = parsed.as_str().to_string();
        // Atomic check-and-insert: only the inserting caller spawns a
        // worker, so one retry chain exists per URL.
        if !self.inner.in_flight.insert(key) {
            self.inner.counters.coalesced.fetch_add(1, Ordering::Relaxed);
            trace!(url = %parsed, "discovery already in flight, coalescing");
            return Ok(());
        }

        self.inner.counters.scheduled.fetch_add(1, Ordering::Relaxed);
        debug!(url = %parsed, "scheduling discovery");
        let request = DiscoveryRequest::new(parsed, Arc::clone(record));
        tokio::spawn(run_attempt(Arc::clone(&self.inner), request));
        Ok(())
    }

    /// Registers a listener. Registering the same listener (by
    /// identity) twice is a no-op.
    pub fn add_listener(&self, listener: Arc<dyn DiscoveryListener>) {
        let mut listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Returns true if the URL currently has an attempt executing or a
    /// retry pending.
    pub fn is_scheduled(&self, url: &str) -> bool {
        self.inner.in_flight.contains(url)
    }

    /// Number of URLs currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Returns a snapshot of the coordinator's counters.
    pub fn stats(&self) -> CoordinatorStats {
        self.inner.counters.snapshot()
    }

    /// Shuts the coordinator down: stops the event pump and pending
    /// retry timers and releases attempts waiting for a permit.
    /// In-flight resolver executions are not interrupted; events
    /// emitted after shutdown are delivered inline.
    pub fn shutdown(&self) {
        info!("discovery coordinator shutting down");
        self.inner.shutdown.cancel();
        self.inner.permits.close();
    }
}

impl Drop for ScheduleCoordinator {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
        self.inner.permits.close();
    }
}

impl Inner {
    /// Sends an event to the pump, falling back to inline dispatch when
    /// the pump is gone (teardown). Listeners therefore must not assume
    /// a particular delivery thread.
    fn emit(&self, event: DiscoveryEvent) {
        if let Err(mpsc::error::SendError(event)) = self.event_tx.send(event) {
            let listeners = self
                .listeners
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            for listener in &listeners {
                dispatch(listener, &event);
            }
        }
    }

    fn unschedule(&self, url: &str) {
        self.in_flight.remove(url);
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Runs one discovery attempt and decides what happens next.
///
/// Boxed because the retry path re-enters this function from the timer
/// task.
fn run_attempt(
    inner: Arc<Inner>,
    mut request: DiscoveryRequest,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        let url = request.url().as_str().to_string();

        if request.is_first_attempt() {
            inner.emit(DiscoveryEvent::Started(url.clone()));
        }

        // Bound concurrent resolver executions. A closed semaphore
        // means shutdown: release the slot and stop quietly.
        let permit = match Arc::clone(&inner.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                inner.unschedule(&url);
                return;
            }
        };

        let reachable = inner.connectivity.is_reachable();
        trace!(%url, attempt = request.attempts(), reachable, "running discovery attempt");

        // The resolver never errors for expected outcomes; anything
        // unwinding out of it is an infrastructure fault, caught here
        // and nowhere else.
        let outcome = std::panic::AssertUnwindSafe(
            inner.resolver.resolve(&mut request, reachable),
        )
        .catch_unwind()
        .await;
        drop(permit);
        inner.counters.attempts.fetch_add(1, Ordering::Relaxed);

        match outcome {
            Ok(()) => {
                let complete = request.record().is_complete();
                // A complete record still retries until the remote
                // service has weighed in once, unless the URL is local
                // and the direct source is authoritative.
                let reschedule =
                    !complete || (!request.service_done() && !request.is_local());

                if complete && !reschedule {
                    inner.unschedule(&url);
                    debug!(%url, "discovery complete, unscheduled");
                }

                inner.emit(DiscoveryEvent::Finished(url.clone(), complete));

                if reschedule {
                    request.count_attempt();
                    inner.counters.retries.fetch_add(1, Ordering::Relaxed);
                    trace!(%url, attempt = request.attempts(), "rescheduling discovery");
                    let delay = inner.config.retry_delay;
                    let timer_inner = Arc::clone(&inner);
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = timer_inner.shutdown.cancelled() => {
                                timer_inner.unschedule(&url);
                            }
                            _ = tokio::time::sleep(delay) => {
                                run_attempt(timer_inner, request).await;
                            }
                        }
                    });
                }
            }
            Err(panic) => {
                // Fail-fast: an infrastructure fault permanently halts
                // retries for this URL. Re-scheduling requires an
                // explicit new schedule_discovery call.
                inner.unschedule(&url);
                inner.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(%url, panic = panic_message(&panic), "discovery attempt panicked, halting retries");
                inner.emit(DiscoveryEvent::Failed(url));
            }
        }
    })
}

/// Extracts a printable message from a panic payload.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

// =============================================================================
// Event pump
// =============================================================================

/// Drains the event channel, serializing listener callbacks on one
/// task.
///
/// On shutdown the pump closes the channel and delivers everything
/// already buffered before exiting, so every accepted event reaches
/// the listeners; sends racing past the close fail and fall back to
/// inline delivery in [`Inner::emit`]. There is no third mode where an
/// accepted event is dropped.
async fn run_event_pump(
    mut event_rx: mpsc::UnboundedReceiver<DiscoveryEvent>,
    listeners: Arc<Mutex<Vec<Arc<dyn DiscoveryListener>>>>,
    shutdown: CancellationToken,
) {
    let deliver = |event: &DiscoveryEvent| {
        let current = listeners.lock().unwrap_or_else(|e| e.into_inner()).clone();
        for listener in &current {
            dispatch(listener, event);
        }
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                // Refuse new events, then flush what was accepted.
                event_rx.close();
                while let Some(event) = event_rx.recv().await {
                    deliver(&event);
                }
                break;
            }
            event = event_rx.recv() => match event {
                Some(event) => deliver(&event),
                None => break,
            },
        }
    }
    debug!("discovery event pump stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_snapshot_reflects_increments() {
        let counters = Counters::default();
        counters.scheduled.fetch_add(3, Ordering::Relaxed);
        counters.failed.fetch_add(1, Ordering::Relaxed);

        let stats = counters.snapshot();
        assert_eq!(stats.scheduled, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.retries, 0);
    }

    #[test]
    fn panic_message_handles_common_payloads() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom".to_string());
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(boxed.as_ref()), "<non-string panic payload>");
    }
}
