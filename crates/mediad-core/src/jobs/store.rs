//! In-memory job store.
//!
//! A shared map of job id to job. Each job has exactly one writer (its
//! executor task); pollers read cloned snapshots. Nothing is persisted —
//! process restart loses history by design. Terminal jobs stay pollable for
//! a TTL measured from the terminal transition, then are evicted lazily on
//! subsequent writes.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::config::StoreConfig;

use super::{Job, JobState};

#[derive(Debug)]
struct Entry {
    job: Job,
    terminal_at: Option<Instant>,
}

#[derive(Debug)]
pub struct JobStore {
    ttl: Duration,
    jobs: RwLock<HashMap<Uuid, Entry>>,
}

impl JobStore {
    pub fn new(cfg: &StoreConfig) -> Self {
        Self {
            ttl: Duration::from_secs(cfg.completed_ttl_secs),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new job. Expired terminal entries are evicted here so the
    /// map cannot grow without bound.
    pub fn insert(&self, job: Job) {
        let now = Instant::now();
        let mut jobs = self.jobs.write().unwrap();
        jobs.retain(|_, e| match e.terminal_at {
            Some(t) => now.duration_since(t) < self.ttl,
            None => true,
        });
        jobs.insert(
            job.id,
            Entry {
                job,
                terminal_at: None,
            },
        );
    }

    /// Snapshot of a job, if still stored.
    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().unwrap().get(&id).map(|e| e.job.clone())
    }

    /// Pending → Running. Returns false (and changes nothing) for any other
    /// current state or an unknown id.
    pub fn mark_running(&self, id: Uuid) -> bool {
        let mut jobs = self.jobs.write().unwrap();
        match jobs.get_mut(&id) {
            Some(entry) if matches!(entry.job.state, JobState::Pending) => {
                entry.job.state = JobState::Running;
                true
            }
            Some(entry) => {
                tracing::warn!(
                    job_id = %id,
                    state = entry.job.state.name(),
                    "refusing non-monotonic transition to running"
                );
                false
            }
            None => false,
        }
    }

    /// Record a terminal state. Returns false (and changes nothing) if the
    /// job is already terminal, unknown, or `state` is not terminal.
    pub fn finish(&self, id: Uuid, state: JobState) -> bool {
        if !state.is_terminal() {
            tracing::warn!(job_id = %id, "finish called with non-terminal state");
            return false;
        }
        let mut jobs = self.jobs.write().unwrap();
        match jobs.get_mut(&id) {
            Some(entry) if !entry.job.state.is_terminal() => {
                tracing::info!(job_id = %id, state = state.name(), "job finished");
                entry.job.state = state;
                entry.terminal_at = Some(Instant::now());
                true
            }
            Some(entry) => {
                tracing::warn!(
                    job_id = %id,
                    state = entry.job.state.name(),
                    "refusing transition out of terminal state"
                );
                false
            }
            None => false,
        }
    }

    /// Number of stored jobs (tests, observability).
    pub fn len(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
