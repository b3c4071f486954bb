//! Extraction error type, classified for user-facing messages.

use std::time::Duration;

use thiserror::Error;

/// Error produced by one extraction call. Classified failures are surfaced
/// to the submitter as the job's failure message and are never retried
/// automatically; the caller may resubmit.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Upstream signalled throttling (HTTP 429 or rate-limit wording).
    #[error("upstream rate limited the request: {0}")]
    UpstreamRateLimited(String),
    /// Upstream refused the request (HTTP 403 or blocking wording).
    #[error("upstream blocked the request: {0}")]
    UpstreamBlocked(String),
    /// Anything else the extractor reported.
    #[error("extraction failed: {0}")]
    Failed(String),
    /// The call exceeded the configured hard ceiling.
    #[error("extraction timed out after {0:?}")]
    TimedOut(Duration),
    /// The extractor process could not be launched at all.
    #[error("failed to launch extractor: {0}")]
    Spawn(#[source] std::io::Error),
}
