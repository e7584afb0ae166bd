//! Domain models for tracks and queue entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::sanitize::sanitize_text;

pub const UNKNOWN_TRACK: &str = "Unknown Track";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

// =============================================================================
// ID Types
// =============================================================================

/// Identifier of a chat on the host messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether `id` is usable as a track identifier.
///
/// Track ids become file names in the downloads directory, so only
/// `[A-Za-z0-9_.-]` is accepted, without a leading dot.
pub fn is_valid_track_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

// =============================================================================
// Platform
// =============================================================================

/// Streaming platform a track originates from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Spotify,
    AppleMusic,
    SoundCloud,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Spotify => "spotify",
            Platform::AppleMusic => "apple_music",
            Platform::SoundCloud => "soundcloud",
        }
    }

    /// Platform whose host appears in `url`, if any.
    pub fn from_url(url: &str) -> Option<Self> {
        let lower = url.to_ascii_lowercase();
        if lower.contains("open.spotify.com") {
            Some(Platform::Spotify)
        } else if lower.contains("music.apple.com") {
            Some(Platform::AppleMusic)
        } else if lower.contains("soundcloud.com") {
            Some(Platform::SoundCloud)
        } else {
            None
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spotify" => Ok(Platform::Spotify),
            "apple_music" | "applemusic" | "apple" => Ok(Platform::AppleMusic),
            "soundcloud" | "sound_cloud" => Ok(Platform::SoundCloud),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

// =============================================================================
// Tracks
// =============================================================================

/// Platform-agnostic search/metadata result.
///
/// Text fields are sanitized by the producer; instances are not mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTrack {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: Option<String>,
    pub cover_url: Option<String>,
    /// 0 means unknown
    pub duration_seconds: u32,
    pub year: Option<u32>,
    pub platform: Platform,
    pub source_url: String,
}

/// Acquisition-ready detail for exactly one track.
///
/// When `decryption_key` is set, `cdn_url` points at an encrypted container;
/// otherwise it points at a directly playable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTrackInfo {
    #[serde(flatten)]
    pub track: CanonicalTrack,
    pub cdn_url: Option<String>,
    /// Hex-encoded symmetric key
    pub decryption_key: Option<String>,
    pub lyrics: Option<String>,
    /// Media already written locally by the normalizer
    pub local_file: Option<PathBuf>,
}

impl ResolvedTrackInfo {
    pub fn id(&self) -> &str {
        &self.track.id
    }

    pub fn is_encrypted(&self) -> bool {
        self.decryption_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

// =============================================================================
// Queue
// =============================================================================

/// One item in a chat's playback queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub track_id: String,
    pub name: String,
    pub artist: String,
    pub url: String,
    pub requested_by: String,
    pub platform: Platform,
    pub duration_seconds: u32,
    pub is_video: bool,
    pub file_path: Option<PathBuf>,
    pub thumbnail: Option<String>,
    /// Remaining repeats of this entry; only meaningful at the queue head
    pub loop_count: u32,
}

impl QueueEntry {
    pub fn new(track: &CanonicalTrack, requested_by: impl Into<String>) -> Self {
        Self {
            track_id: track.id.clone(),
            name: track.name.clone(),
            artist: track.artist.clone(),
            url: track.source_url.clone(),
            requested_by: requested_by.into(),
            platform: track.platform,
            duration_seconds: track.duration_seconds,
            is_video: false,
            file_path: None,
            thumbnail: track.cover_url.clone(),
            loop_count: 0,
        }
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_video(mut self, is_video: bool) -> Self {
        self.is_video = is_video;
        self
    }

    /// Copy with every display string passed through [`sanitize_text`].
    pub fn sanitized(self) -> Self {
        Self {
            name: sanitize_text(&self.name),
            artist: sanitize_text(&self.artist),
            url: sanitize_text(&self.url),
            requested_by: sanitize_text(&self.requested_by),
            thumbnail: self.thumbnail.as_deref().map(sanitize_text),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> CanonicalTrack {
        CanonicalTrack {
            id: "4uLU6hMCjMI75M1A2tKUQC".to_string(),
            name: "Never Gonna Give You Up".to_string(),
            artist: "Rick Astley".to_string(),
            album: None,
            cover_url: Some("https://i.scdn.co/image/abc".to_string()),
            duration_seconds: 213,
            year: Some(1987),
            platform: Platform::Spotify,
            source_url: "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC".to_string(),
        }
    }

    #[test]
    fn test_track_id_validation() {
        assert!(is_valid_track_id("4uLU6hMCjMI75M1A2tKUQC"));
        assert!(is_valid_track_id("soundcloud-123_a.b"));
        assert!(!is_valid_track_id(""));
        assert!(!is_valid_track_id("../etc/passwd"));
        assert!(!is_valid_track_id(".hidden"));
        assert!(!is_valid_track_id("a b"));
        assert!(!is_valid_track_id(&"a".repeat(129)));
    }

    #[test]
    fn test_platform_round_trip_through_str() {
        for platform in [Platform::Spotify, Platform::AppleMusic, Platform::SoundCloud] {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
        assert!("deezer".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_from_url() {
        assert_eq!(
            Platform::from_url("https://music.apple.com/us/album/x/1"),
            Some(Platform::AppleMusic)
        );
        assert_eq!(
            Platform::from_url("HTTPS://SoundCloud.com/artist/song"),
            Some(Platform::SoundCloud)
        );
        assert_eq!(Platform::from_url("https://example.com"), None);
    }

    #[test]
    fn test_platform_serializes_snake_case() {
        let json = serde_json::to_string(&Platform::AppleMusic).unwrap();
        assert_eq!(json, "\"apple_music\"");
    }

    #[test]
    fn test_queue_entry_from_track() {
        let entry = QueueEntry::new(&track(), "alice")
            .with_video(true)
            .with_file_path("/d/4uLU6hMCjMI75M1A2tKUQC.mp3");

        assert_eq!(entry.track_id, "4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(entry.thumbnail.as_deref(), Some("https://i.scdn.co/image/abc"));
        assert!(entry.is_video);
        assert_eq!(entry.loop_count, 0);
        assert!(entry.file_path.is_some());
    }

    #[test]
    fn test_sanitized_entry() {
        let mut entry = QueueEntry::new(&track(), "<b>bob</b>");
        entry.name = "Rock & Roll\u{0}".to_string();

        let clean = entry.sanitized();
        assert_eq!(clean.name, "Rock &amp; Roll");
        assert_eq!(clean.requested_by, "&lt;b&gt;bob&lt;/b&gt;");
        assert_eq!(clean.track_id, "4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn test_encryption_flag_needs_non_empty_key() {
        let mut info = ResolvedTrackInfo {
            track: track(),
            cdn_url: Some("https://cdn/x".to_string()),
            decryption_key: Some(String::new()),
            lyrics: None,
            local_file: None,
        };
        assert!(!info.is_encrypted());

        info.decryption_key = Some("00112233445566778899aabbccddeeff".to_string());
        assert!(info.is_encrypted());
        assert_eq!(info.id(), "4uLU6hMCjMI75M1A2tKUQC");
    }
}
