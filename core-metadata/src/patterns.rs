//! Supported platform URL shapes.

use core_library::Platform;
use regex::Regex;
use std::sync::OnceLock;

struct UrlPattern {
    platform: Platform,
    regex: Regex,
}

fn patterns() -> &'static [UrlPattern] {
    static PATTERNS: OnceLock<Vec<UrlPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                Platform::AppleMusic,
                r"(?i)^(https?://)?(music\.apple\.com/([a-z]{2}/)?(album|playlist|song)/[a-zA-Z0-9\-_]+/[0-9]+)(\?[^#]*)?(#.*)?$",
            ),
            (
                Platform::Spotify,
                r"(?i)^(https?://)?(open\.spotify\.com/(track|playlist|album|artist)/[a-zA-Z0-9]+)(\?[^#]*)?(#.*)?$",
            ),
            (
                Platform::SoundCloud,
                r"(?i)^(https?://)?(www\.)?soundcloud\.com/[a-zA-Z0-9_-]+(/(sets/)?[a-zA-Z0-9_-]+)?(\?[^#]*)?(#.*)?$",
            ),
        ]
        .into_iter()
        .map(|(platform, pattern)| UrlPattern {
            platform,
            regex: Regex::new(pattern).expect("platform URL pattern is valid"),
        })
        .collect()
    })
}

/// Trims whitespace and drops everything from the first `?` or `#`.
pub fn sanitize_query(query: &str) -> &str {
    let trimmed = query.trim();
    trimmed.split(['?', '#']).next().unwrap_or(trimmed)
}

/// Platform whose URL shape `url` matches exactly.
pub fn match_platform(url: &str) -> Option<Platform> {
    let url = url.trim();
    patterns()
        .iter()
        .find(|p| p.regex.is_match(url))
        .map(|p| p.platform)
}

/// Whether `url` is a supported platform URL.
pub fn validate_url(url: &str) -> bool {
    match_platform(url).is_some()
}
