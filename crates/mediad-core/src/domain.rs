//! Source-domain classification.
//!
//! Every submitted URL maps to a coarse domain tag used as the partition key
//! for admission control and extractor pacing. Classification is a pure,
//! total function over the raw URL string: known hosts are recognized by
//! substring, everything else (including malformed input) is `Other`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse origin of a media URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainTag {
    Youtube,
    Tiktok,
    Twitter,
    Instagram,
    Other,
}

impl DomainTag {
    /// Classify a URL by substring match. Never fails.
    pub fn classify(url: &str) -> Self {
        let url = url.to_ascii_lowercase();
        if url.contains("youtube.com") || url.contains("youtu.be") {
            DomainTag::Youtube
        } else if url.contains("tiktok.com") {
            DomainTag::Tiktok
        } else if url.contains("twitter.com") || url.contains("x.com") {
            DomainTag::Twitter
        } else if url.contains("instagram.com") {
            DomainTag::Instagram
        } else {
            DomainTag::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainTag::Youtube => "youtube",
            DomainTag::Tiktok => "tiktok",
            DomainTag::Twitter => "twitter",
            DomainTag::Instagram => "instagram",
            DomainTag::Other => "other",
        }
    }

    /// Canonical site homepage, used as the referer in request profiles.
    /// `Other` has no sensible referer.
    pub fn referer(&self) -> Option<&'static str> {
        match self {
            DomainTag::Youtube => Some("https://www.youtube.com/"),
            DomainTag::Tiktok => Some("https://www.tiktok.com/"),
            DomainTag::Twitter => Some("https://x.com/"),
            DomainTag::Instagram => Some("https://www.instagram.com/"),
            DomainTag::Other => None,
        }
    }
}

impl fmt::Display for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
