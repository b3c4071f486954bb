//! yt-dlp process extractor.
//!
//! Spawns the `yt-dlp` binary per extraction, captures its JSON metadata
//! dump, and maps failures through the output classifier. Transient network
//! retries ride on the extractor's own `--retries` flag; a hard call
//! timeout bounds how long a stuck upstream can hold a worker.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::ExtractorConfig;

use super::classify::error_from_output;
use super::{ExtractError, Extraction, MediaExtractor, MediaKind, RequestProfile};

/// Output template: media id plus whatever extension format negotiation
/// settles on. Post-processing may still rename, which is why the result
/// locator exists.
const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

pub struct YtDlpExtractor {
    cfg: ExtractorConfig,
    output_dir: PathBuf,
}

impl YtDlpExtractor {
    pub fn new(cfg: ExtractorConfig, output_dir: PathBuf) -> Self {
        Self { cfg, output_dir }
    }

    fn build_args(&self, url: &str, kind: MediaKind, profile: &RequestProfile) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--no-playlist".into(),
            "--geo-bypass".into(),
            "--quiet".into(),
            "--no-warnings".into(),
            "--print-json".into(),
            "--retries".into(),
            self.cfg.retries.to_string(),
            "--socket-timeout".into(),
            self.cfg.socket_timeout_secs.to_string(),
            "--user-agent".into(),
            profile.user_agent.into(),
            "--add-header".into(),
            format!("Accept: {}", profile.accept),
            "--add-header".into(),
            format!("Accept-Language: {}", profile.accept_language),
            "-o".into(),
            self.output_dir.join(OUTPUT_TEMPLATE).display().to_string(),
        ];

        if let Some(referer) = profile.referer {
            args.push("--referer".into());
            args.push(referer.into());
        }

        match kind {
            MediaKind::Video => {
                args.push("-f".into());
                args.push(format!(
                    "bestvideo[height<={}]+bestaudio/best",
                    self.cfg.max_video_height
                ));
                args.push("--merge-output-format".into());
                args.push(self.cfg.video_container.clone());
            }
            MediaKind::Audio => {
                args.push("-f".into());
                args.push(format!("bestaudio[ext={}]/bestaudio", self.cfg.audio_format));
                args.push("-x".into());
                args.push("--audio-format".into());
                args.push(self.cfg.audio_format.clone());
            }
        }

        args.push(url.into());
        args
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn extract(
        &self,
        url: &str,
        kind: MediaKind,
        profile: &RequestProfile,
    ) -> Result<Extraction, ExtractError> {
        let args = self.build_args(url, kind, profile);
        tracing::debug!(binary = %self.cfg.binary, ?args, "invoking extractor");

        let call_timeout = Duration::from_secs(self.cfg.call_timeout_secs);
        let mut cmd = Command::new(&self.cfg.binary);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the output future on timeout must reap the child.
            .kill_on_drop(true);

        let output = match tokio::time::timeout(call_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => return Err(ExtractError::Spawn(err)),
            Err(_) => return Err(ExtractError::TimedOut(call_timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(error_from_output(&stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_extraction(&stdout, &self.output_dir, kind, &self.cfg)
    }
}

/// Parse the extractor's JSON dump into an [`Extraction`].
///
/// The declared path is taken from the per-download record when present
/// (reflects merge/post-processing), else the pre-processing filename, else
/// reconstructed from the output template.
fn parse_extraction(
    stdout: &str,
    output_dir: &Path,
    kind: MediaKind,
    cfg: &ExtractorConfig,
) -> Result<Extraction, ExtractError> {
    let json_line = stdout
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| ExtractError::Failed("extractor produced no metadata".to_string()))?;

    let info: serde_json::Value = serde_json::from_str(json_line)
        .map_err(|e| ExtractError::Failed(format!("unreadable extractor metadata: {e}")))?;

    let media_id = info
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ExtractError::Failed("extractor metadata missing media id".to_string()))?
        .to_string();

    let declared_path = info
        .get("requested_downloads")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("filepath"))
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .or_else(|| {
            info.get("_filename")
                .and_then(|v| v.as_str())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| {
            let ext = match kind {
                MediaKind::Audio => cfg.audio_format.as_str(),
                MediaKind::Video => info
                    .get("ext")
                    .and_then(|v| v.as_str())
                    .unwrap_or(cfg.video_container.as_str()),
            };
            output_dir.join(format!("{media_id}.{ext}"))
        });

    Ok(Extraction {
        declared_path,
        media_id,
        title: info
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        thumbnail: info
            .get("thumbnail")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        duration_secs: info.get("duration").and_then(|v| v.as_f64()),
        uploader: info
            .get("uploader")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}
