//! Admission control: per-domain rate limiting and concurrency caps.
//!
//! Every submission is checked synchronously before a job is dispatched.
//! State is a single in-memory map guarded by one mutex (contention is a
//! handful of submissions per minute); nothing is persisted across restart.
//! The clock is passed in by the caller so policy decisions are testable
//! without sleeping.

mod window;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;
use uuid::Uuid;

use crate::config::AdmissionConfig;
use crate::domain::DomainTag;

use window::{ActiveEntry, DomainWindow};

/// Why a submission was turned away. Messages are user-facing and name the
/// domain so the caller knows which partition is saturated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionRejection {
    #[error("Rate limit exceeded for {domain}. Please wait a few minutes before trying again.")]
    RateLimited { domain: DomainTag },
    #[error("Too many active downloads from {domain}. Please wait for current downloads to complete.")]
    TooManyConcurrent { domain: DomainTag },
}

impl AdmissionRejection {
    pub fn domain(&self) -> DomainTag {
        match self {
            AdmissionRejection::RateLimited { domain }
            | AdmissionRejection::TooManyConcurrent { domain } => *domain,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    windows: HashMap<DomainTag, DomainWindow>,
    active: HashMap<Uuid, ActiveEntry>,
}

/// Tracks recent submissions and active jobs per domain tag and decides
/// whether a new submission may be dispatched.
#[derive(Debug)]
pub struct AdmissionController {
    policy: AdmissionConfig,
    state: Mutex<State>,
}

impl AdmissionController {
    pub fn new(policy: AdmissionConfig) -> Self {
        Self {
            policy,
            state: Mutex::new(State::default()),
        }
    }

    /// Decide whether a submission for `domain` may proceed at `now`.
    ///
    /// On `Ok`, the submission timestamp is recorded and an active entry is
    /// registered under `job_id`; the caller must `release(job_id)` exactly
    /// once when the job reaches a terminal state. On `Err`, no state
    /// changes.
    pub fn admit(
        &self,
        domain: DomainTag,
        job_id: Uuid,
        now: Instant,
    ) -> Result<(), AdmissionRejection> {
        let rate_window = Duration::from_secs(self.policy.rate_window_secs);
        let staleness = Duration::from_secs(self.policy.active_staleness_secs);
        let retention = Duration::from_secs(self.policy.history_retention_secs);

        let mut state = self.state.lock().unwrap();

        let recent = state
            .windows
            .get(&domain)
            .map(|w| w.recent_count(now, rate_window))
            .unwrap_or(0);
        if recent >= self.policy.rate_cap {
            return Err(AdmissionRejection::RateLimited { domain });
        }

        // Stale entries (never released) must not block new work.
        let active = state
            .active
            .values()
            .filter(|e| e.domain == domain && now.duration_since(e.started_at) < staleness)
            .count();
        if active >= self.policy.max_active_per_domain {
            return Err(AdmissionRejection::TooManyConcurrent { domain });
        }

        state
            .windows
            .entry(domain)
            .or_default()
            .record(now, retention);
        state.active.insert(
            job_id,
            ActiveEntry {
                domain,
                started_at: now,
            },
        );
        tracing::debug!(
            domain = %domain,
            job_id = %job_id,
            recent_submissions = recent + 1,
            active_jobs = active + 1,
            "submission admitted"
        );
        Ok(())
    }

    /// Remove the active entry for a finished job. Idempotent; releasing an
    /// unknown id is a no-op.
    pub fn release(&self, job_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        if state.active.remove(&job_id).is_some() {
            tracing::debug!(job_id = %job_id, "active entry released");
        }
    }

    /// Number of non-stale active jobs for a domain (observability, tests).
    pub fn active_count(&self, domain: DomainTag, now: Instant) -> usize {
        let staleness = Duration::from_secs(self.policy.active_staleness_secs);
        let state = self.state.lock().unwrap();
        state
            .active
            .values()
            .filter(|e| e.domain == domain && now.duration_since(e.started_at) < staleness)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> AdmissionController {
        AdmissionController::new(AdmissionConfig::default())
    }

    fn admit_n(
        ctl: &AdmissionController,
        domain: DomainTag,
        n: usize,
        now: Instant,
    ) -> Vec<Uuid> {
        (0..n)
            .map(|_| {
                let id = Uuid::new_v4();
                ctl.admit(domain, id, now).expect("within caps");
                // Release immediately so only the rate limit is exercised.
                ctl.release(id);
                id
            })
            .collect()
    }

    #[test]
    fn sixth_submission_in_window_is_rate_limited() {
        let ctl = controller();
        let now = Instant::now();
        admit_n(&ctl, DomainTag::Tiktok, 5, now);

        let err = ctl
            .admit(DomainTag::Tiktok, Uuid::new_v4(), now + Duration::from_secs(30))
            .unwrap_err();
        assert_eq!(
            err,
            AdmissionRejection::RateLimited {
                domain: DomainTag::Tiktok
            }
        );
        assert!(err.to_string().contains("tiktok"));
    }

    #[test]
    fn submissions_outside_window_do_not_count() {
        let ctl = controller();
        let base = Instant::now();
        admit_n(&ctl, DomainTag::Youtube, 5, base);

        // 301 seconds later the window has emptied.
        let later = base + Duration::from_secs(301);
        ctl.admit(DomainTag::Youtube, Uuid::new_v4(), later)
            .expect("old submissions excluded from the count");
    }

    #[test]
    fn third_concurrent_job_is_rejected_other_domains_unaffected() {
        let ctl = controller();
        let now = Instant::now();
        ctl.admit(DomainTag::Youtube, Uuid::new_v4(), now).unwrap();
        ctl.admit(DomainTag::Youtube, Uuid::new_v4(), now).unwrap();

        let err = ctl
            .admit(DomainTag::Youtube, Uuid::new_v4(), now)
            .unwrap_err();
        assert_eq!(
            err,
            AdmissionRejection::TooManyConcurrent {
                domain: DomainTag::Youtube
            }
        );

        // A different tag has its own counters.
        ctl.admit(DomainTag::Tiktok, Uuid::new_v4(), now)
            .expect("other domain unaffected");
    }

    #[test]
    fn stale_active_entries_do_not_block() {
        let ctl = controller();
        let base = Instant::now();
        // Two jobs that were never released.
        ctl.admit(DomainTag::Twitter, Uuid::new_v4(), base).unwrap();
        ctl.admit(DomainTag::Twitter, Uuid::new_v4(), base).unwrap();

        // Past the staleness horizon they no longer count.
        let later = base + Duration::from_secs(121);
        ctl.admit(DomainTag::Twitter, Uuid::new_v4(), later)
            .expect("undead entries are non-blocking");
        assert_eq!(ctl.active_count(DomainTag::Twitter, later), 1);
    }

    #[test]
    fn release_frees_a_concurrency_slot() {
        let ctl = controller();
        let now = Instant::now();
        let first = Uuid::new_v4();
        ctl.admit(DomainTag::Instagram, first, now).unwrap();
        ctl.admit(DomainTag::Instagram, Uuid::new_v4(), now).unwrap();
        assert!(ctl.admit(DomainTag::Instagram, Uuid::new_v4(), now).is_err());

        ctl.release(first);
        ctl.admit(DomainTag::Instagram, Uuid::new_v4(), now)
            .expect("slot freed after release");
    }

    #[test]
    fn release_is_idempotent() {
        let ctl = controller();
        let id = Uuid::new_v4();
        ctl.admit(DomainTag::Other, id, Instant::now()).unwrap();
        ctl.release(id);
        ctl.release(id);
        ctl.release(Uuid::new_v4());
    }

    #[test]
    fn rejection_leaves_state_untouched() {
        let ctl = controller();
        let now = Instant::now();
        ctl.admit(DomainTag::Youtube, Uuid::new_v4(), now).unwrap();
        ctl.admit(DomainTag::Youtube, Uuid::new_v4(), now).unwrap();

        // Rejected submissions must not consume rate-limit budget.
        for _ in 0..10 {
            assert!(ctl.admit(DomainTag::Youtube, Uuid::new_v4(), now).is_err());
        }
        assert_eq!(ctl.active_count(DomainTag::Youtube, now), 2);
    }
}
