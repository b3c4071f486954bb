//! Extraction adapter: the sole consumer of the external media extractor.
//!
//! The extractor itself (site parsing, format negotiation, byte fetching) is
//! a black box behind the [`MediaExtractor`] trait; this module owns
//! everything around the call — request-profile rotation, pre-request
//! jitter, per-domain pacing, and error classification.

mod classify;
mod error;
mod pacing;
mod profile;
mod ytdlp;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::PacingConfig;
use crate::domain::DomainTag;

pub use classify::{classify_extractor_output, UpstreamErrorKind};
pub use error::ExtractError;
pub use pacing::DomainPacer;
pub use profile::RequestProfile;
pub use ytdlp::YtDlpExtractor;

/// Which side of the media the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

/// What a successful extraction reports back. The declared path is what the
/// extractor *claims* it produced; verifying it on disk is the result
/// locator's job, not ours.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub declared_path: PathBuf,
    /// Extractor-provided media identifier (also the output filename stem).
    pub media_id: String,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration_secs: Option<f64>,
    pub uploader: Option<String>,
}

/// External extractor collaborator. Implementations may block for seconds to
/// minutes; callers run them on worker tasks, never on the request path.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    async fn extract(
        &self,
        url: &str,
        kind: MediaKind,
        profile: &RequestProfile,
    ) -> Result<Extraction, ExtractError>;
}

/// Wraps a [`MediaExtractor`] with profile rotation and domain pacing.
/// One instance is shared by all executor tasks.
pub struct ExtractionAdapter {
    extractor: Arc<dyn MediaExtractor>,
    pacer: DomainPacer,
}

impl ExtractionAdapter {
    pub fn new(extractor: Arc<dyn MediaExtractor>, pacing: PacingConfig) -> Self {
        Self {
            extractor,
            pacer: DomainPacer::new(pacing),
        }
    }

    /// Run one extraction: select a profile, pace, call the extractor, and
    /// record the completion time for subsequent pacing decisions.
    pub async fn run(
        &self,
        url: &str,
        kind: MediaKind,
        domain: DomainTag,
    ) -> Result<Extraction, ExtractError> {
        let profile = {
            let mut rng = rand::thread_rng();
            RequestProfile::select(domain, &mut rng)
        };

        self.pacer.pause(domain).await;

        let started = Instant::now();
        let result = self.extractor.extract(url, kind, &profile).await;
        self.pacer.record_completion(domain, Instant::now());

        match &result {
            Ok(extraction) => tracing::info!(
                domain = %domain,
                media_id = %extraction.media_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "extraction succeeded"
            ),
            Err(err) => tracing::warn!(
                domain = %domain,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "extraction failed"
            ),
        }
        result
    }
}
