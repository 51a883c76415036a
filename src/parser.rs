//! Finds links inside user messages.

use lazy_regex::lazy_regex;

/// Scheme followed by any run of non-whitespace characters.
static RE_URL: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"https?://\S+");

/// Returns the first `http://` or `https://` token in `text`, by position.
///
/// Only the syntactic shape is checked. Unreachable or malformed links are
/// left for the extractor to reject.
///
/// # Examples
///
/// ```
/// use video_link_bot::parser::find_first_url;
///
/// let text = "check this out https://a.test/x and https://b.test/y";
/// assert_eq!(find_first_url(text), Some("https://a.test/x"));
/// assert_eq!(find_first_url("hello there"), None);
/// ```
#[must_use]
pub fn find_first_url(text: &str) -> Option<&str> {
    RE_URL.find(text).map(|m| m.as_str())
}
