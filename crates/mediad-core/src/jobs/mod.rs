//! Job model, in-memory job store, and the orchestrator tying admission,
//! extraction, and artifact resolution together.

mod orchestrator;
mod store;

use std::path::PathBuf;
use std::time::SystemTime;

use uuid::Uuid;

use crate::domain::DomainTag;
use crate::extract::{ExtractError, MediaKind};

pub use orchestrator::{ArtifactError, Orchestrator};
pub use store::JobStore;

/// Metadata for a successfully produced artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaArtifact {
    pub path: PathBuf,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration_secs: Option<f64>,
    pub uploader: Option<String>,
}

/// Why a job failed, for the user-facing status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UpstreamRateLimited,
    UpstreamBlocked,
    Extraction,
    /// Extraction reported success but no finished file could be resolved.
    ArtifactMissing,
}

#[derive(Debug, Clone)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<ExtractError> for JobFailure {
    fn from(err: ExtractError) -> Self {
        let kind = match &err {
            ExtractError::UpstreamRateLimited(_) => FailureKind::UpstreamRateLimited,
            ExtractError::UpstreamBlocked(_) => FailureKind::UpstreamBlocked,
            ExtractError::Failed(_) | ExtractError::TimedOut(_) | ExtractError::Spawn(_) => {
                FailureKind::Extraction
            }
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Job lifecycle. Transitions are monotonic:
/// Pending → Running → Succeeded | Failed, enforced by the store.
#[derive(Debug, Clone)]
pub enum JobState {
    Pending,
    Running,
    Succeeded(MediaArtifact),
    Failed(JobFailure),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded(_) | JobState::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Succeeded(_) => "succeeded",
            JobState::Failed(_) => "failed",
        }
    }
}

/// One submitted download job. Mutated only by its executor task via the
/// store; pollers get cloned snapshots.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub url: String,
    pub kind: MediaKind,
    pub domain: DomainTag,
    pub submitted_at: SystemTime,
    pub state: JobState,
}

impl Job {
    pub fn new(id: Uuid, url: String, kind: MediaKind, domain: DomainTag) -> Self {
        Self {
            id,
            url,
            kind,
            domain,
            submitted_at: SystemTime::now(),
            state: JobState::Pending,
        }
    }
}
