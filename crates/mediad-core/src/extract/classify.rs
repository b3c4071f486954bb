//! Classify extractor failure output into upstream error kinds.

use super::error::ExtractError;

/// Coarse classification of an extractor failure, driving the user-facing
/// message only — no automatic retry hangs off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// HTTP 429 or rate-limit wording.
    RateLimited,
    /// HTTP 403 or blocking wording.
    Blocked,
    /// Everything else.
    Other,
}

const RATE_LIMIT_MARKERS: &[&str] = &["429", "rate limit", "rate-limit", "too many requests"];

const BLOCKED_MARKERS: &[&str] = &[
    "403",
    "forbidden",
    "blocked",
    "access denied",
    "sign in to confirm",
];

/// Classify extractor stderr. Rate-limit wording wins over blocking wording
/// when both appear, since throttling is the more actionable diagnosis.
pub fn classify_extractor_output(stderr: &str) -> UpstreamErrorKind {
    let lower = stderr.to_ascii_lowercase();
    if RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
        UpstreamErrorKind::RateLimited
    } else if BLOCKED_MARKERS.iter().any(|m| lower.contains(m)) {
        UpstreamErrorKind::Blocked
    } else {
        UpstreamErrorKind::Other
    }
}

/// Build an [`ExtractError`] from failure output, keeping the most relevant
/// line (the extractor prefixes real errors with `ERROR:`).
pub fn error_from_output(stderr: &str) -> ExtractError {
    let message = stderr
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with("ERROR"))
        .or_else(|| stderr.lines().rev().find(|l| !l.trim().is_empty()))
        .unwrap_or("extractor reported no error output")
        .trim()
        .to_string();

    match classify_extractor_output(stderr) {
        UpstreamErrorKind::RateLimited => ExtractError::UpstreamRateLimited(message),
        UpstreamErrorKind::Blocked => ExtractError::UpstreamBlocked(message),
        UpstreamErrorKind::Other => ExtractError::Failed(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_429_and_wording_classify_as_rate_limited() {
        assert_eq!(
            classify_extractor_output("ERROR: HTTP Error 429: Too Many Requests"),
            UpstreamErrorKind::RateLimited
        );
        assert_eq!(
            classify_extractor_output("ERROR: rate limit reached, try later"),
            UpstreamErrorKind::RateLimited
        );
    }

    #[test]
    fn http_403_and_wording_classify_as_blocked() {
        assert_eq!(
            classify_extractor_output("ERROR: HTTP Error 403: Forbidden"),
            UpstreamErrorKind::Blocked
        );
        assert_eq!(
            classify_extractor_output("ERROR: Sign in to confirm you're not a bot"),
            UpstreamErrorKind::Blocked
        );
    }

    #[test]
    fn anything_else_is_other() {
        assert_eq!(
            classify_extractor_output("ERROR: Unsupported URL: https://example.com"),
            UpstreamErrorKind::Other
        );
        assert_eq!(classify_extractor_output(""), UpstreamErrorKind::Other);
    }

    #[test]
    fn rate_limit_wins_when_both_appear() {
        assert_eq!(
            classify_extractor_output("403 forbidden after too many requests"),
            UpstreamErrorKind::RateLimited
        );
    }

    #[test]
    fn error_message_prefers_error_line() {
        let stderr = "WARNING: something minor\nERROR: HTTP Error 429: Too Many Requests\n";
        match error_from_output(stderr) {
            ExtractError::UpstreamRateLimited(msg) => {
                assert!(msg.contains("429"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn error_message_falls_back_to_last_line() {
        match error_from_output("something broke\n") {
            ExtractError::Failed(msg) => assert_eq!(msg, "something broke"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
