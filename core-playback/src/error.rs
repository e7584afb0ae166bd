//! # Playback Error Types
//!
//! Errors raised while turning resolved tracks into local files.

use core_fetch::FetchError;
use core_runtime::error::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during track acquisition.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Track id cannot be used as a file name.
    #[error("Invalid track identifier: {0}")]
    InvalidTrack(String),

    // ========================================================================
    // Media Errors
    // ========================================================================
    /// Neither a CDN location nor a local file is known for the track.
    #[error("Missing CDN URL for track: {0}")]
    MissingSource(String),

    /// Decryption key is not a 16-byte hex string.
    #[error("Invalid decryption key for track {track_id}: {reason}")]
    InvalidKey { track_id: String, reason: String },

    /// Decrypted container is too short or unwritable for header repair.
    #[error("Container repair failed: {0}")]
    Repair(String),

    /// Remux tool exited unsuccessfully.
    #[error("Remux failed with exit code {code:?}: {stderr}")]
    Remux { code: Option<i32>, stderr: String },

    /// Remux tool did not finish in time and was killed.
    #[error("Remux timed out after {0:?}")]
    RemuxTimeout(Duration),

    /// Remux tool could not be started.
    #[error("Remux tool unavailable: {0}")]
    RemuxUnavailable(String),

    // ========================================================================
    // Transfer Errors
    // ========================================================================
    /// Media download failed.
    #[error("Download failed: {0}")]
    Fetch(#[from] FetchError),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// Filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The acquisition pool was shut down.
    #[error("Acquisition pool closed")]
    PoolClosed,

    /// Owning session stopped before the acquisition finished.
    #[error("Acquisition cancelled")]
    Cancelled,
}

impl PlaybackError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlaybackError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PlaybackError::InvalidTrack(_) => ErrorKind::InvalidInput,
            PlaybackError::MissingSource(_)
            | PlaybackError::InvalidKey { .. }
            | PlaybackError::Repair(_)
            | PlaybackError::Remux { .. }
            | PlaybackError::RemuxTimeout(_)
            | PlaybackError::RemuxUnavailable(_) => ErrorKind::Media,
            PlaybackError::Fetch(e) => e.kind(),
            PlaybackError::Io { .. } | PlaybackError::PoolClosed => ErrorKind::Resource,
            PlaybackError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns `true` if the error came from the media step itself.
    pub fn is_media_error(&self) -> bool {
        self.kind() == ErrorKind::Media
    }

    pub fn user_message(&self) -> String {
        match self {
            PlaybackError::InvalidTrack(_) => "Invalid track.".to_string(),
            PlaybackError::MissingSource(_) => "No download source for this track.".to_string(),
            PlaybackError::InvalidKey { .. }
            | PlaybackError::Repair(_)
            | PlaybackError::Remux { .. }
            | PlaybackError::RemuxTimeout(_)
            | PlaybackError::RemuxUnavailable(_) => "Could not process this track.".to_string(),
            PlaybackError::Fetch(e) => e.user_message(),
            PlaybackError::Io { .. } | PlaybackError::PoolClosed => {
                "Could not save the track.".to_string()
            }
            PlaybackError::Cancelled => "Playback was stopped.".to_string(),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
