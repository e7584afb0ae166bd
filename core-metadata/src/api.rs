//! Client for the upstream track metadata API.

use core_async::fs;
use core_async::sync::KeyedMutex;
use core_fetch::{write_bytes_atomically, FetchClient, FetchError};
use core_library::{is_valid_track_id, CanonicalTrack, ResolvedTrackInfo};
use core_runtime::config::EngineConfig;
use core_runtime::logging::redact_if_sensitive;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{MetadataError, Result};
use crate::patterns::{sanitize_query, validate_url};
use crate::response::{detail_for_local_file, detail_from_object, ApiResponse};

/// Resolves URLs, search text and track ids through the metadata API.
#[derive(Clone)]
pub struct TrackApi {
    fetch: FetchClient,
    api_url: String,
    api_key: Option<String>,
    /// Serializes media writes per track id
    stores: Arc<KeyedMutex<String>>,
}

impl std::fmt::Debug for TrackApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackApi")
            .field("api_url", &self.api_url)
            .field(
                "api_key",
                &self
                    .api_key
                    .as_deref()
                    .map(|key| redact_if_sensitive("api_key", key)),
            )
            .finish()
    }
}

impl TrackApi {
    pub fn new(fetch: FetchClient, api_url: impl Into<String>) -> Self {
        Self {
            fetch,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            stores: Arc::new(KeyedMutex::new()),
        }
    }

    pub fn from_config(fetch: FetchClient, config: &EngineConfig) -> Self {
        Self::new(fetch, config.api_url.clone()).with_api_key(config.api_key.clone())
    }

    /// Sends `Authorization: Bearer <key>` on every call when set.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Whether `url` is a supported platform URL.
    pub fn validate(&self, url: &str) -> bool {
        validate_url(url)
    }

    /// Tracks behind a platform URL.
    #[instrument(skip(self))]
    pub async fn resolve(&self, url: &str) -> Result<Vec<CanonicalTrack>> {
        let query = sanitize_query(url);
        if query.is_empty() || !self.validate(query) {
            return Err(MetadataError::InvalidUrl(query.to_string()));
        }

        let response = self.call("get_url", query).await?;
        non_empty(response.into_tracks()?, query)
    }

    /// Tracks matching free text. Platform URLs are resolved instead.
    #[instrument(skip(self))]
    pub async fn search(&self, text: &str) -> Result<Vec<CanonicalTrack>> {
        let query = sanitize_query(text);
        if query.is_empty() {
            return Err(MetadataError::EmptyQuery);
        }
        if self.validate(query) {
            return self.resolve(query).await;
        }

        let response = self.call("search_track", query).await?;
        non_empty(response.into_tracks()?, query)
    }

    /// Acquisition-ready detail for one track id.
    ///
    /// When the API answers with the media itself, it is written to
    /// `{downloads_dir}/{id}.mp3` and referenced through `local_file`.
    #[instrument(skip(self))]
    pub async fn detail(&self, id: &str) -> Result<ResolvedTrackInfo> {
        let query = sanitize_query(id);
        if query.is_empty() {
            return Err(MetadataError::EmptyQuery);
        }
        if !is_valid_track_id(query) {
            return Err(MetadataError::InvalidTrackId(query.to_string()));
        }

        match self.call("get_track", query).await? {
            ApiResponse::Track(object) | ApiResponse::Object(object) => {
                if object.is_empty() {
                    return Err(MetadataError::NotFound(query.to_string()));
                }
                detail_from_object(&object, query)
            }
            ApiResponse::Results(_) => Err(MetadataError::Decode(
                "expected a single track, got a result list".to_string(),
            )),
            ApiResponse::Binary(bytes) if bytes.is_empty() => {
                Err(MetadataError::NotFound(query.to_string()))
            }
            ApiResponse::Binary(bytes) => {
                let path = self.store_media(query, &bytes).await?;
                info!(track_id = %query, size = bytes.len(), "Stored media returned by metadata API");
                Ok(detail_for_local_file(query, path))
            }
        }
    }

    async fn call(&self, endpoint: &str, query: &str) -> Result<ApiResponse> {
        let url = format!("{}/{}/{}", self.api_url, endpoint, encode_path(query));
        let auth = self.api_key.as_ref().map(|key| format!("Bearer {}", key));
        let headers: Vec<(&str, &str)> = auth
            .as_deref()
            .map(|value| ("Authorization", value))
            .into_iter()
            .collect();

        debug!(endpoint, "Calling metadata API");
        let body = self.fetch.request(&url, &[], &headers).await.map_err(|err| {
            if err.status_code() == Some(404) {
                MetadataError::NotFound(query.to_string())
            } else {
                warn!(endpoint, error = %err, "Metadata API request failed");
                MetadataError::Fetch(err)
            }
        })?;

        ApiResponse::decode(body)
    }

    /// Writes media for `id` once; later and concurrent callers reuse it.
    async fn store_media(&self, id: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.fetch.downloads_dir().join(format!("{}.mp3", id));
        let _guard = self.stores.lock(id.to_string()).await;

        if fs::try_exists(&path).await.unwrap_or(false) {
            debug!(track_id = %id, "Media already stored");
            return Ok(path);
        }

        write_bytes_atomically(&path, bytes)
            .await
            .map_err(|err| match err {
                FetchError::Io { path, source } => MetadataError::Io { path, source },
                other => MetadataError::Fetch(other),
            })?;
        Ok(path)
    }
}

fn non_empty(tracks: Vec<CanonicalTrack>, query: &str) -> Result<Vec<CanonicalTrack>> {
    if tracks.is_empty() {
        Err(MetadataError::NotFound(query.to_string()))
    } else {
        Ok(tracks)
    }
}

/// Percent-encodes a path segment, keeping `/` literal.
fn encode_path(query: &str) -> String {
    urlencoding::encode(query).replace("%2F", "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_keeps_slashes() {
        assert_eq!(
            encode_path("https://open.spotify.com/track/abc"),
            "https%3A//open.spotify.com/track/abc"
        );
        assert_eq!(encode_path("lofi beats"), "lofi%20beats");
    }
}
