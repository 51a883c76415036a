//! yt-dlp extractor
//!
//! Runs the `yt-dlp` executable in "print URL only" mode and turns its
//! output into an [`Extraction`]. Nothing is downloaded.

use super::{Extraction, FailureKind, LinkExtractor};
use crate::config::Settings;
use std::process::Command;
use tracing::debug;

/// Patterns meaning the site or URL is not handled by yt-dlp
const UNSUPPORTED_PATTERNS: &[&str] = &[
    "Unsupported URL",
    "is not a valid URL",
    "No suitable extractor",
];

/// Patterns meaning the media exists but cannot be served to us
const UNAVAILABLE_PATTERNS: &[&str] = &[
    "Video unavailable",
    "Private video",
    "This video is not available",
    "Sign in to confirm your age",
    "age-restricted",
    "members-only",
    "This video is private",
    "removed by the uploader",
    "no longer available",
    "blocked it in your country",
    "geo-restricted",
    "who has blocked it on copyright grounds",
    "terminated account",
    "This video has been removed",
    "Premieres in",
    "This live event will begin",
    "Join this channel to get access",
    "Sign in to view this video",
    "HTTP Error 403",
    "HTTP Error 404",
];

/// Patterns pointing at connectivity problems
const NETWORK_PATTERNS: &[&str] = &[
    "Connection reset",
    "Connection refused",
    "Connection timed out",
    "Unable to download webpage",
    "HTTP Error 429",
    "HTTP Error 503",
    "Read timed out",
    "network is unreachable",
    "Temporary failure in name resolution",
    "Name or service not known",
];

/// Patterns meaning the page was parsed but nothing playable came out
const NO_FORMAT_PATTERNS: &[&str] = &[
    "Requested format is not available",
    "No video formats found",
    "Unable to extract video data",
    "There's no video in this",
];

fn matches_any(patterns: &[&str], message: &str) -> bool {
    patterns.iter().any(|pattern| message.contains(pattern))
}

/// Map yt-dlp's error output to a diagnostic category.
#[must_use]
pub fn classify_error(message: &str) -> FailureKind {
    if matches_any(UNSUPPORTED_PATTERNS, message) {
        FailureKind::Unsupported
    } else if matches_any(UNAVAILABLE_PATTERNS, message) {
        FailureKind::Unavailable
    } else if matches_any(NETWORK_PATTERNS, message) {
        FailureKind::Network
    } else if matches_any(NO_FORMAT_PATTERNS, message) {
        FailureKind::NoPlayableFormat
    } else {
        FailureKind::Internal
    }
}

/// Build an [`Extraction`] from a finished yt-dlp run.
///
/// On success the first non-empty stdout line is the media URL. Anything
/// that is not an http(s) URL counts as "no playable format".
#[must_use]
pub fn interpret_output(success: bool, stdout: &str, stderr: &str) -> Extraction {
    if !success {
        let message = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        return Extraction::failed(classify_error(message), message);
    }

    match stdout.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(line) if line.starts_with("http://") || line.starts_with("https://") => {
            Extraction::Resolved(line.to_string())
        }
        Some(line) => Extraction::failed(
            FailureKind::NoPlayableFormat,
            format!("unexpected yt-dlp output: {line}"),
        ),
        None => Extraction::failed(FailureKind::NoPlayableFormat, "yt-dlp printed no URL"),
    }
}

/// Resolves links by shelling out to yt-dlp.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    program: String,
    format: String,
}

impl YtDlpExtractor {
    /// Create an extractor running `program` with format selector `format`.
    #[must_use]
    pub fn new(program: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            format: format.into(),
        }
    }

    /// Create an extractor from the loaded settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.ytdlp_path, &settings.ytdlp_format)
    }

    /// Command-line arguments for resolving `url`.
    #[must_use]
    pub fn args<'a>(&'a self, url: &'a str) -> Vec<&'a str> {
        vec![
            "--no-playlist",
            "--no-warnings",
            "-f",
            self.format.as_str(),
            "--get-url",
            "--",
            url,
        ]
    }
}

impl LinkExtractor for YtDlpExtractor {
    fn extract(&self, url: &str) -> Extraction {
        debug!(url = %url, program = %self.program, "Running yt-dlp");

        let output = match Command::new(&self.program).args(self.args(url)).output() {
            Ok(output) => output,
            Err(e) => {
                return Extraction::failed(
                    FailureKind::Internal,
                    format!("failed to start {}: {e}", self.program),
                );
            }
        };

        interpret_output(
            output.status.success(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }
}
