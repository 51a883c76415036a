//! Media link extraction
//!
//! Resolves a video page URL to a direct media URL. The actual site parsing
//! is delegated to an external tool ([`ytdlp::YtDlpExtractor`]); every way it
//! can fail is folded into [`Extraction::Failed`] so callers handle one case.

/// Bounded offload of blocking extraction calls
pub mod pool;
/// yt-dlp backed extractor
pub mod ytdlp;

pub use pool::ExtractionPool;
pub use ytdlp::YtDlpExtractor;

use std::fmt;

/// Diagnostic category of a failed extraction.
///
/// Only ever logged for operators; users see one uniform message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The site or URL is not supported by the extractor
    Unsupported,
    /// The media exists but is private, removed, geo-blocked or age-gated
    Unavailable,
    /// Network error while talking to the hosting site
    Network,
    /// The extractor finished but produced no playable URL
    NoPlayableFormat,
    /// The extractor could not be started or crashed
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unsupported => "unsupported",
            Self::Unavailable => "unavailable",
            Self::Network => "network",
            Self::NoPlayableFormat => "no_playable_format",
            Self::Internal => "internal",
        };
        f.write_str(label)
    }
}

/// Why an extraction produced no media URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct ExtractionFailure {
    /// Diagnostic category
    pub kind: FailureKind,
    /// Raw detail from the extractor, for logs
    pub detail: String,
}

impl ExtractionFailure {
    /// Create a failure of the given kind.
    #[must_use]
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Outcome of resolving one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Direct, fetchable media URL
    Resolved(String),
    /// No media URL could be produced
    Failed(ExtractionFailure),
}

impl Extraction {
    /// Shorthand for a failed extraction.
    #[must_use]
    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failed(ExtractionFailure::new(kind, detail))
    }
}

/// Blocking link resolver.
///
/// Implementations may block on I/O for seconds; never call them directly
/// from async code, go through [`ExtractionPool`].
#[cfg_attr(test, mockall::automock)]
pub trait LinkExtractor: Send + Sync {
    /// Resolve `url` to a direct media URL.
    fn extract(&self, url: &str) -> Extraction;
}
