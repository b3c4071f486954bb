use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Admission policy parameters (`[admission]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Sliding window for the per-domain submission rate limit, in seconds.
    pub rate_window_secs: u64,
    /// Maximum submissions per domain within the rate window.
    pub rate_cap: usize,
    /// Maximum concurrently active jobs per domain.
    pub max_active_per_domain: usize,
    /// Active entries older than this are ignored for the concurrency cap
    /// (guards against entries that were never cleaned up).
    pub active_staleness_secs: u64,
    /// Submission history older than this is pruned on write.
    pub history_retention_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            rate_window_secs: 300,
            rate_cap: 5,
            max_active_per_domain: 2,
            active_staleness_secs: 120,
            history_retention_secs: 86_400,
        }
    }
}

/// Per-domain pacing parameters (`[pacing]` section). This is the soft
/// circuit breaker in front of the extractor, distinct from the hard
/// admission caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Minimum gap since the previous extraction for the same domain, in seconds.
    pub min_gap_secs: u64,
    /// Jitter added on top of the remaining gap, in milliseconds (min..max).
    pub gap_jitter_ms: (u64, u64),
    /// Extractions per domain before an extended cooldown kicks in.
    pub burst_limit: u32,
    /// Extended cooldown range in seconds (min..max).
    pub cooldown_secs: (u64, u64),
    /// Pre-request jitter in milliseconds (min..max), applied to every call.
    pub start_jitter_ms: (u64, u64),
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_gap_secs: 10,
            gap_jitter_ms: (1_000, 3_000),
            burst_limit: 20,
            cooldown_secs: (5, 15),
            start_jitter_ms: (300, 1_500),
        }
    }
}

/// Extractor invocation parameters (`[extractor]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Extractor binary to spawn.
    pub binary: String,
    /// Resolution cap for video requests; falls back to best available.
    pub max_video_height: u32,
    /// Target container for merged video output.
    pub video_container: String,
    /// Preferred audio container; falls back to best audio available.
    pub audio_format: String,
    /// Retry count handed to the extractor for transient network failures.
    pub retries: u32,
    /// Socket timeout handed to the extractor, in seconds.
    pub socket_timeout_secs: u64,
    /// Hard ceiling on one extraction call, in seconds. A stuck upstream
    /// must not hold a worker indefinitely.
    pub call_timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            max_video_height: 720,
            video_container: "mp4".to_string(),
            audio_format: "m4a".to_string(),
            retries: 5,
            socket_timeout_secs: 30,
            call_timeout_secs: 600,
        }
    }
}

/// Job store parameters (`[store]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How long a terminal job stays pollable before lazy eviction, in seconds.
    pub completed_ttl_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            completed_ttl_secs: 3_600,
        }
    }
}

/// Global configuration loaded from `~/.config/mediad/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediadConfig {
    /// Shared output directory for finished artifacts. Defaults to
    /// `<XDG data home>/mediad/downloads` when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for MediadConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            bind_addr: "127.0.0.1:8040".to_string(),
            admission: AdmissionConfig::default(),
            pacing: PacingConfig::default(),
            extractor: ExtractorConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl MediadConfig {
    /// Resolve the output directory, falling back to the XDG data dir.
    pub fn resolved_output_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("mediad")?;
        Ok(xdg_dirs.get_data_home().join("downloads"))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mediad")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MediadConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MediadConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MediadConfig = toml::from_str(&data)?;
    Ok(cfg)
}
