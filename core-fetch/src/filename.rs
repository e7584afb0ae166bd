//! Download filename derivation.

use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

fn disposition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"filename="?([^";]+)"?"#).expect("content-disposition pattern is valid")
    })
}

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("unsafe-char pattern is valid"))
}

/// Removes path-unsafe characters and surrounding whitespace.
pub fn sanitize_filename(name: &str) -> String {
    unsafe_chars().replace_all(name, "").trim().to_string()
}

/// Picks a filename for a download without an explicit destination.
///
/// `Content-Disposition` wins, then the last URL path segment, then a random
/// `<uuid>.tmp`. The result is always sanitized and never empty, `.` or `..`.
pub fn derive_filename(url: &str, content_disposition: Option<&str>) -> String {
    let from_header = content_disposition
        .and_then(|cd| disposition_pattern().captures(cd))
        .and_then(|caps| caps.get(1))
        .map(|m| {
            urlencoding::decode(m.as_str())
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| m.as_str().to_string())
        });

    let candidate = from_header.unwrap_or_else(|| url_basename(url).to_string());
    let sanitized = sanitize_filename(&candidate);

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        format!("{}.tmp", Uuid::new_v4().simple())
    } else {
        sanitized
    }
}

fn url_basename(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let path = without_query
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, path)| path).unwrap_or(""))
        .unwrap_or(without_query);
    path.rsplit('/').next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_filename(r#" a<b>c:d"e/f\g|h?i*j.mp3 "#), "abcdefghij.mp3");
    }

    #[test]
    fn test_content_disposition_wins() {
        let name = derive_filename(
            "https://cdn.example.com/x/y.bin",
            Some(r#"attachment; filename="My%20Song.mp3""#),
        );
        assert_eq!(name, "My Song.mp3");
    }

    #[test]
    fn test_unquoted_content_disposition() {
        let name = derive_filename("https://cdn.example.com/", Some("inline; filename=track.ogg"));
        assert_eq!(name, "track.ogg");
    }

    #[test]
    fn test_url_basename_ignores_query() {
        let name = derive_filename("https://cdn.example.com/audio/abc.mp3?sig=1#t=3", None);
        assert_eq!(name, "abc.mp3");
    }

    #[test]
    fn test_falls_back_to_random_name() {
        let name = derive_filename("https://cdn.example.com/", None);
        assert!(name.ends_with(".tmp"));
        assert_eq!(name.len(), 32 + 4);

        let host_only = derive_filename("https://cdn.example.com", None);
        assert!(host_only.ends_with(".tmp"));
    }

    #[test]
    fn test_traversal_is_neutralized() {
        let name = derive_filename("https://x/", Some(r#"filename="../../etc/passwd""#));
        assert!(!name.contains('/'));
        assert_eq!(name, "....etcpasswd");
    }
}
