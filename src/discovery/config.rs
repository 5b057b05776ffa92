//! Coordinator and resolver configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::probe::ExclusionFilter;

/// Default cap on concurrent discovery attempts.
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Default delay before a rescheduled attempt runs (15 seconds).
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 15;

/// URL schemes accepted for scheduling. Anything else is silently
/// ignored before it enters the pipeline.
pub const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "file", "ftp"];

/// Configuration for the schedule coordinator.
#[derive(Clone)]
pub struct CoordinatorConfig {
    /// Maximum concurrent discovery attempts. Bounds total concurrent
    /// outbound network operations from this subsystem.
    pub max_concurrent: usize,
    /// Fixed delay between retry attempts for one URL.
    pub retry_delay: Duration,
    /// Optional veto filter applied before any probing.
    pub exclusion_filter: Option<Arc<dyn ExclusionFilter>>,
}

impl CoordinatorConfig {
    /// Sets the concurrent-attempt cap.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Sets the retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the exclusion filter.
    pub fn with_exclusion_filter(mut self, filter: Arc<dyn ExclusionFilter>) -> Self {
        self.exclusion_filter = Some(filter);
        self
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            exclusion_filter: None,
        }
    }
}

impl std::fmt::Debug for CoordinatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorConfig")
            .field("max_concurrent", &self.max_concurrent)
            .field("retry_delay", &self.retry_delay)
            .field("exclusion_filter", &self.exclusion_filter.is_some())
            .finish()
    }
}

/// Returns true if `scheme` is accepted for scheduling.
pub fn scheme_allowed(scheme: &str) -> bool {
    ALLOWED_SCHEMES.contains(&scheme)
}
