//! Artifact resolution: find the file an extraction actually produced.
//!
//! The extractor's declared output name does not always match the file on
//! disk (container negotiation, post-processing renames), so resolution is
//! two-phase: trust the declared path when it holds a non-empty file,
//! otherwise scan the output directory for a plausible finished file. A
//! partial-suffixed file is never a valid result.

use std::fs;
use std::path::{Path, PathBuf};

/// In-progress download suffixes the extractor leaves behind.
pub const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl"];

fn is_partial(name: &str) -> bool {
    PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s))
}

fn has_content(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}

/// Tokens from a title usable for fuzzy filename matching: alphanumeric
/// runs longer than two characters, lowercased.
fn title_tokens(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Resolve the produced file for an extraction.
///
/// Phase 1: the declared path itself, if present and non-empty. Phase 2: a
/// directory scan preferring filenames containing the extractor media id,
/// then filenames containing a title token; first non-empty match wins.
/// Scan errors are treated as no-match (logged), matching the best-effort
/// contract.
pub fn locate(
    output_dir: &Path,
    declared: &Path,
    media_id: &str,
    title: Option<&str>,
) -> Option<PathBuf> {
    if has_content(declared) {
        return Some(declared.to_path_buf());
    }
    tracing::debug!(
        declared = %declared.display(),
        "declared path missing or empty, scanning output directory"
    );

    let entries = match fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %output_dir.display(), error = %err, "output dir scan failed");
            return None;
        }
    };

    let tokens = title.map(|t| title_tokens(t)).unwrap_or_default();
    let mut id_match: Option<PathBuf> = None;
    let mut token_match: Option<PathBuf> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_partial(name) || !has_content(&path) {
            continue;
        }
        let lower = name.to_lowercase();
        if id_match.is_none() && !media_id.is_empty() && lower.contains(&media_id.to_lowercase()) {
            id_match = Some(path);
        } else if token_match.is_none() && tokens.iter().any(|t| lower.contains(t.as_str())) {
            token_match = Some(path);
        }
    }

    let found = id_match.or(token_match);
    if let Some(path) = &found {
        tracing::info!(path = %path.display(), "artifact resolved by scan");
    }
    found
}

/// Best-effort removal of partial files left behind by a failed extraction.
/// Only files whose name references the media id or a title token are
/// touched; removal failures are logged and swallowed.
pub fn cleanup_partials(output_dir: &Path, media_id: &str, title: Option<&str>) {
    let Ok(entries) = fs::read_dir(output_dir) else {
        return;
    };

    let tokens = title.map(|t| title_tokens(t)).unwrap_or_default();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_partial(name) {
            continue;
        }
        let lower = name.to_lowercase();
        let matches = (!media_id.is_empty() && lower.contains(&media_id.to_lowercase()))
            || tokens.iter().any(|t| lower.contains(t.as_str()));
        if !matches {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => tracing::info!(path = %path.display(), "removed partial file"),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove partial file")
            }
        }
    }
}

/// Remove every partial-suffixed file in the output directory. Run once at
/// startup to clear leftovers from a previous process.
pub fn sweep_partials(output_dir: &Path) {
    let Ok(entries) = fs::read_dir(output_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_part = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(is_partial)
            .unwrap_or(false);
        if is_part {
            match fs::remove_file(&path) {
                Ok(()) => tracing::info!(path = %path.display(), "swept partial file"),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to sweep partial file")
                }
            }
        }
    }
}
