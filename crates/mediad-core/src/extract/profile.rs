//! Request profiles: rotating user agents and browser-like headers.
//!
//! Upstream sites throttle obvious automation; each extraction borrows a
//! browser identity from a fixed pool plus a referer pointing at the
//! domain's homepage. Selection is random but logged so a given extraction
//! can be attributed to its profile when debugging.

use rand::Rng;

use crate::domain::DomainTag;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Browser identity used for one extraction call.
#[derive(Debug, Clone)]
pub struct RequestProfile {
    pub user_agent: &'static str,
    pub referer: Option<&'static str>,
    pub accept: &'static str,
    pub accept_language: &'static str,
}

impl RequestProfile {
    /// Pick a random profile for the given domain.
    pub fn select<R: Rng + ?Sized>(domain: DomainTag, rng: &mut R) -> Self {
        let index = rng.gen_range(0..USER_AGENTS.len());
        tracing::debug!(domain = %domain, ua_index = index, "selected request profile");
        Self {
            user_agent: USER_AGENTS[index],
            referer: domain.referer(),
            accept: ACCEPT,
            accept_language: ACCEPT_LANGUAGE,
        }
    }
}
