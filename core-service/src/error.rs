use core_runtime::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] core_metadata::MetadataError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),

    /// Reported by the call-transport collaborator.
    #[error("Call probe failed for chat {chat_id}: {message}")]
    Probe { chat_id: i64, message: String },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InitializationFailed(_) | ServiceError::Config(_) => ErrorKind::Resource,
            ServiceError::Metadata(e) => e.kind(),
            ServiceError::Playback(e) => e.kind(),
            ServiceError::Probe { .. } => ErrorKind::Transport,
        }
    }

    /// Short text safe to show in a chat.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::InitializationFailed(_) | ServiceError::Config(_) => {
                "The music service is not available right now.".to_string()
            }
            ServiceError::Metadata(e) => e.user_message(),
            ServiceError::Playback(e) => e.user_message(),
            ServiceError::Probe { .. } => "Could not reach the voice chat.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use core_metadata::MetadataError;
    use core_playback::PlaybackError;

    #[test]
    fn test_kind_delegates_to_component() {
        let err = ServiceError::from(MetadataError::NotFound("x".to_string()));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ServiceError::from(PlaybackError::Cancelled);
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.user_message(), "Playback was stopped.");
    }
}
