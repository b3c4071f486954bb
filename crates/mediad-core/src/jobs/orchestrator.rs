//! Job orchestration: classify → admit → dispatch → resolve → record.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

use crate::admission::{AdmissionController, AdmissionRejection};
use crate::config::MediadConfig;
use crate::domain::DomainTag;
use crate::extract::{ExtractionAdapter, MediaExtractor, MediaKind};
use crate::locate;

use super::{FailureKind, Job, JobFailure, JobState, JobStore, MediaArtifact};

/// Why an artifact cannot be handed out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("no such job")]
    UnknownJob,
    #[error("download is not finished yet")]
    NotReady,
    #[error("download failed: {0}")]
    Failed(String),
    #[error("downloaded file not found")]
    Missing,
}

/// The job entry point. Submission is synchronous and non-blocking; the
/// actual extraction runs on a spawned worker task. Cheap to clone — all
/// state is shared behind `Arc`s.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<JobStore>,
    admission: Arc<AdmissionController>,
    adapter: Arc<ExtractionAdapter>,
    output_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        cfg: &MediadConfig,
        extractor: Arc<dyn MediaExtractor>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            store: Arc::new(JobStore::new(&cfg.store)),
            admission: Arc::new(AdmissionController::new(cfg.admission.clone())),
            adapter: Arc::new(ExtractionAdapter::new(extractor, cfg.pacing.clone())),
            output_dir,
        }
    }

    /// Classify, admit, register, and dispatch a job. Returns the job id
    /// immediately; progress is observable via [`Orchestrator::status`].
    pub fn submit(&self, url: &str, kind: MediaKind) -> Result<Uuid, AdmissionRejection> {
        let domain = DomainTag::classify(url);
        let id = Uuid::new_v4();
        self.admission.admit(domain, id, Instant::now())?;

        self.store
            .insert(Job::new(id, url.to_string(), kind, domain));
        tracing::info!(job_id = %id, domain = %domain, kind = kind.as_str(), "job submitted");

        let this = self.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            this.run_job(id, &url, kind, domain).await;
        });

        Ok(id)
    }

    /// Read-only snapshot of a job.
    pub fn status(&self, id: Uuid) -> Option<Job> {
        self.store.get(id)
    }

    /// Resolve the artifact path for a succeeded job, distinguishing
    /// not-ready from vanished-file.
    pub fn artifact(&self, id: Uuid) -> Result<MediaArtifact, ArtifactError> {
        let job = self.store.get(id).ok_or(ArtifactError::UnknownJob)?;
        match job.state {
            JobState::Pending | JobState::Running => Err(ArtifactError::NotReady),
            JobState::Failed(failure) => Err(ArtifactError::Failed(failure.message)),
            JobState::Succeeded(artifact) => {
                let exists = std::fs::metadata(&artifact.path)
                    .map(|m| m.is_file() && m.len() > 0)
                    .unwrap_or(false);
                if exists {
                    Ok(artifact)
                } else {
                    Err(ArtifactError::Missing)
                }
            }
        }
    }

    /// Executor body for one job. The single writer for this job's state;
    /// the admission entry is released exactly once, after the terminal
    /// transition is recorded.
    async fn run_job(&self, id: Uuid, url: &str, kind: MediaKind, domain: DomainTag) {
        if !self.store.mark_running(id) {
            // Evicted or tampered with before we started; just drop the slot.
            self.admission.release(id);
            return;
        }

        let state = match self.adapter.run(url, kind, domain).await {
            Ok(extraction) => {
                let found = locate::locate(
                    &self.output_dir,
                    &extraction.declared_path,
                    &extraction.media_id,
                    extraction.title.as_deref(),
                );
                match found {
                    Some(path) => JobState::Succeeded(MediaArtifact {
                        path,
                        title: extraction.title,
                        thumbnail: extraction.thumbnail,
                        duration_secs: extraction.duration_secs,
                        uploader: extraction.uploader,
                    }),
                    None => {
                        locate::cleanup_partials(
                            &self.output_dir,
                            &extraction.media_id,
                            extraction.title.as_deref(),
                        );
                        JobState::Failed(JobFailure {
                            kind: FailureKind::ArtifactMissing,
                            message: "downloaded file was empty or not found".to_string(),
                        })
                    }
                }
            }
            Err(err) => JobState::Failed(JobFailure::from(err)),
        };

        self.store.finish(id, state);
        self.admission.release(id);
    }
}
