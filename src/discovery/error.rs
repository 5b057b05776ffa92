//! Error types for the discovery module.

use thiserror::Error;

/// Errors reported synchronously by `schedule_discovery`.
///
/// These are the only synchronous failures in the pipeline; everything
/// downstream of a successful schedule call is reported through
/// listener events.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Neither the argument nor the record yields a URL to probe.
    #[error("no URL to discover: none given and the record has no feed address")]
    MissingUrl,

    /// The URL string could not be parsed.
    #[error("invalid discovery URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}
