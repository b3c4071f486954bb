//! Per-domain extraction pacing: a soft circuit breaker in front of the
//! extractor, distinct from the hard admission caps.
//!
//! Two rules: keep a minimum gap since the previous completion for the same
//! domain (plus jitter), and after a burst of extractions force an extended
//! cooldown. Delay *decisions* are pure in the injected `now`, so tests
//! never sleep.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::PacingConfig;
use crate::domain::DomainTag;

#[derive(Debug, Default)]
struct PacerState {
    last_completed: Option<Instant>,
    since_cooldown: u32,
}

/// Tracks extraction completion times and burst counters per domain tag.
#[derive(Debug)]
pub struct DomainPacer {
    cfg: PacingConfig,
    state: Mutex<HashMap<DomainTag, PacerState>>,
}

fn jitter<R: Rng + ?Sized>(range_ms: (u64, u64), rng: &mut R) -> Duration {
    let (lo, hi) = range_ms;
    Duration::from_millis(rng.gen_range(lo..=hi.max(lo)))
}

impl DomainPacer {
    pub fn new(cfg: PacingConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Compute how long the next extraction for `domain` should wait as of
    /// `now`. Counts the call toward the burst limit.
    pub fn next_delay<R: Rng + ?Sized>(
        &self,
        domain: DomainTag,
        now: Instant,
        rng: &mut R,
    ) -> Duration {
        let mut state = self.state.lock().unwrap();
        let entry = state.entry(domain).or_default();
        entry.since_cooldown += 1;

        // Every call gets a short randomized lead-in to avoid bursty patterns.
        let mut delay = jitter(self.cfg.start_jitter_ms, rng);

        if let Some(last) = entry.last_completed {
            let min_gap = Duration::from_secs(self.cfg.min_gap_secs);
            let since = now.duration_since(last);
            if since < min_gap {
                delay += min_gap - since + jitter(self.cfg.gap_jitter_ms, rng);
            }
        }

        if entry.since_cooldown >= self.cfg.burst_limit {
            let (lo, hi) = self.cfg.cooldown_secs;
            let cooldown = Duration::from_secs(rng.gen_range(lo..=hi.max(lo)));
            tracing::info!(
                domain = %domain,
                cooldown_secs = cooldown.as_secs(),
                "burst limit reached, extended cooldown"
            );
            entry.since_cooldown = 0;
            delay += cooldown;
        }

        delay
    }

    /// Record that an extraction for `domain` finished at `now`.
    pub fn record_completion(&self, domain: DomainTag, now: Instant) {
        let mut state = self.state.lock().unwrap();
        state.entry(domain).or_default().last_completed = Some(now);
    }

    /// Sleep for the computed delay before the next extraction.
    pub async fn pause(&self, domain: DomainTag) {
        let delay = {
            let mut rng = rand::thread_rng();
            self.next_delay(domain, Instant::now(), &mut rng)
        };
        if !delay.is_zero() {
            tracing::debug!(domain = %domain, delay_ms = delay.as_millis() as u64, "pacing");
            tokio::time::sleep(delay).await;
        }
    }
}
