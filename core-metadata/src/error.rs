use core_fetch::FetchError;
use core_runtime::error::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Invalid or unsupported URL: {0}")]
    InvalidUrl(String),

    #[error("No search query provided")]
    EmptyQuery,

    #[error("Invalid track identifier: {0}")]
    InvalidTrackId(String),

    #[error("No tracks found for: {0}")]
    NotFound(String),

    #[error("Upstream request failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Unexpected response format: {0}")]
    Decode(String),

    #[error("Failed to store track media at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MetadataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetadataError::InvalidUrl(_)
            | MetadataError::EmptyQuery
            | MetadataError::InvalidTrackId(_) => ErrorKind::InvalidInput,
            MetadataError::NotFound(_) => ErrorKind::NotFound,
            MetadataError::Fetch(e) => e.kind(),
            MetadataError::Decode(_) => ErrorKind::Decode,
            MetadataError::Io { .. } => ErrorKind::Resource,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            MetadataError::Fetch(e) => e.status_code(),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            MetadataError::InvalidUrl(_) => "Invalid or unsupported URL provided.".to_string(),
            MetadataError::EmptyQuery => "No search query provided.".to_string(),
            MetadataError::InvalidTrackId(_) => "Invalid track identifier.".to_string(),
            MetadataError::NotFound(_) => "No tracks found.".to_string(),
            MetadataError::Fetch(e) => e.user_message(),
            MetadataError::Decode(_) => {
                "The music service sent an unexpected reply.".to_string()
            }
            MetadataError::Io { .. } => "Could not save the track.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(MetadataError::EmptyQuery.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            MetadataError::NotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            MetadataError::Fetch(FetchError::Transport("reset".into())).kind(),
            ErrorKind::Transport
        );
        assert_eq!(MetadataError::Decode("x".into()).kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_user_message_hides_detail() {
        let err = MetadataError::InvalidUrl("<b>https://evil</b>".into());
        assert!(!err.user_message().contains("evil"));
    }
}
