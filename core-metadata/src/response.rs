//! Upstream payload decoding.
//!
//! The metadata API answers with one of several shapes and no discriminator
//! field. [`ApiResponse::decode`] classifies a body once, by key presence, and
//! callers match the result exhaustively. The `*_from_*` mappers then apply the
//! per-field default policy and sanitize every display string.

use bytes::Bytes;
use core_fetch::FetchBody;
use core_library::{
    is_valid_track_id, parse_duration, sanitize_text, CanonicalTrack, Platform,
    ResolvedTrackInfo, UNKNOWN_ARTIST, UNKNOWN_TRACK,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{MetadataError, Result};

pub type JsonObject = Map<String, Value>;

/// One upstream response, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Object keyed by an `id` field: exactly one track.
    Track(JsonObject),
    /// Object carrying a `results` list.
    Results(Vec<Value>),
    /// Object with neither key. Detail lookups use this shape.
    Object(JsonObject),
    /// Raw media bytes.
    Binary(Bytes),
}

impl ApiResponse {
    pub fn decode(body: FetchBody) -> Result<Self> {
        match body {
            FetchBody::Bytes(bytes) => Ok(ApiResponse::Binary(bytes)),
            FetchBody::Json(Value::Object(mut object)) => {
                if object.contains_key("id") {
                    return Ok(ApiResponse::Track(object));
                }
                match object.remove("results") {
                    Some(Value::Array(items)) => Ok(ApiResponse::Results(items)),
                    Some(Value::Null) => Ok(ApiResponse::Results(Vec::new())),
                    Some(other) => Err(MetadataError::Decode(format!(
                        "`results` is not a list ({})",
                        json_type(&other)
                    ))),
                    None => Ok(ApiResponse::Object(object)),
                }
            }
            FetchBody::Json(other) => Err(MetadataError::Decode(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }

    /// Tracks carried by a listing-style response.
    ///
    /// Malformed `results` elements are skipped. An object with neither key
    /// is an empty listing.
    pub fn into_tracks(self) -> Result<Vec<CanonicalTrack>> {
        match self {
            ApiResponse::Track(object) => Ok(track_from_object(&object).into_iter().collect()),
            ApiResponse::Results(items) => {
                let total = items.len();
                let tracks: Vec<_> = items
                    .iter()
                    .filter_map(|item| item.as_object().and_then(track_from_object))
                    .collect();
                if tracks.len() < total {
                    debug!(
                        skipped = total - tracks.len(),
                        total, "Skipped malformed result entries"
                    );
                }
                Ok(tracks)
            }
            ApiResponse::Object(_) => Ok(Vec::new()),
            ApiResponse::Binary(bytes) => Err(MetadataError::Decode(format!(
                "expected track metadata, got {} bytes of binary data",
                bytes.len()
            ))),
        }
    }
}

/// Maps one listing element. `None` when it carries no usable id.
pub fn track_from_object(object: &JsonObject) -> Option<CanonicalTrack> {
    let id = string_field(object, "id")?;
    if !is_valid_track_id(&id) {
        debug!(id = %id, "Ignoring result with unusable id");
        return None;
    }

    let source_url = string_field(object, "spotify_url").or_else(|| string_field(object, "url"));
    let platform = platform_of(object, source_url.as_deref());

    Some(CanonicalTrack {
        name: display_or(object, "name", UNKNOWN_TRACK),
        artist: artist_of(object),
        album: display_field(object, "album"),
        cover_url: display_field(object, "album_art").or_else(|| display_field(object, "cover")),
        duration_seconds: object.get("duration").map(parse_duration).unwrap_or(0),
        year: year_of(object),
        source_url: sanitize_text(&source_url.unwrap_or_else(|| default_source_url(&id))),
        platform,
        id,
    })
}

/// Maps a detail object for `query`.
///
/// The id comes from `tc`, then `id`, then the query itself. CDN location and
/// key are kept verbatim; escaping would corrupt them.
pub fn detail_from_object(object: &JsonObject, query: &str) -> Result<ResolvedTrackInfo> {
    let id = string_field(object, "tc")
        .or_else(|| string_field(object, "id"))
        .unwrap_or_else(|| query.to_string());
    if !is_valid_track_id(&id) {
        return Err(MetadataError::Decode(format!("unusable track id {:?}", id)));
    }

    let source_url = string_field(object, "spotify_url").unwrap_or_else(|| default_source_url(&id));

    let track = CanonicalTrack {
        name: display_or(object, "name", UNKNOWN_TRACK),
        artist: artist_of(object),
        album: display_field(object, "album"),
        cover_url: display_field(object, "cover").or_else(|| display_field(object, "album_art")),
        duration_seconds: object.get("duration").map(parse_duration).unwrap_or(0),
        year: year_of(object),
        platform: Platform::Spotify,
        source_url: sanitize_text(&source_url),
        id,
    };

    Ok(ResolvedTrackInfo {
        track,
        cdn_url: string_field(object, "cdnurl"),
        decryption_key: string_field(object, "key"),
        lyrics: display_field(object, "lyrics"),
        local_file: None,
    })
}

/// Detail record for media the API returned directly.
pub fn detail_for_local_file(id: &str, path: std::path::PathBuf) -> ResolvedTrackInfo {
    ResolvedTrackInfo {
        track: CanonicalTrack {
            id: id.to_string(),
            name: UNKNOWN_TRACK.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: None,
            cover_url: None,
            duration_seconds: 0,
            year: None,
            platform: Platform::Spotify,
            source_url: default_source_url(id),
        },
        cdn_url: None,
        decryption_key: None,
        lyrics: None,
        local_file: Some(path),
    }
}

pub fn default_source_url(id: &str) -> String {
    format!("https://open.spotify.com/track/{}", id)
}

/// Trimmed, non-empty string value of `key`.
fn string_field(object: &JsonObject, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn display_field(object: &JsonObject, key: &str) -> Option<String> {
    string_field(object, key)
        .map(|s| sanitize_text(&s))
        .filter(|s| !s.is_empty())
}

fn display_or(object: &JsonObject, key: &str, default: &str) -> String {
    display_field(object, key).unwrap_or_else(|| default.to_string())
}

fn artist_of(object: &JsonObject) -> String {
    let joined = match object.get("artists") {
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect();
            (!names.is_empty()).then(|| names.join(", "))
        }
        Some(Value::String(name)) if !name.trim().is_empty() => Some(name.trim().to_string()),
        _ => None,
    };

    joined
        .or_else(|| string_field(object, "artist"))
        .map(|artist| sanitize_text(&artist))
        .filter(|artist| !artist.is_empty())
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
}

fn year_of(object: &JsonObject) -> Option<u32> {
    let year = match object.get("year")? {
        Value::Number(n) => n.as_u64().and_then(|y| u32::try_from(y).ok()),
        Value::String(s) => s.trim().get(..4).and_then(|y| y.parse().ok()),
        _ => None,
    };
    year.filter(|y| *y > 0)
}

fn platform_of(object: &JsonObject, source_url: Option<&str>) -> Platform {
    string_field(object, "platform")
        .and_then(|p| p.parse().ok())
        .or_else(|| source_url.and_then(Platform::from_url))
        .unwrap_or_default()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
