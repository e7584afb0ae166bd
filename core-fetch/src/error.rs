use bridge_traits::error::BridgeError;
use core_runtime::error::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    /// No response was received (connect, TLS, reset, timeout, broken body).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidInput(_) => ErrorKind::InvalidInput,
            FetchError::Transport(_) => ErrorKind::Transport,
            FetchError::Http { status: 404, .. } => ErrorKind::NotFound,
            FetchError::Http { .. } => ErrorKind::Upstream,
            FetchError::Decode(_) => ErrorKind::Decode,
            FetchError::Io { .. } => ErrorKind::Resource,
        }
    }

    /// HTTP status observed for this failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Short message safe to show to an end user.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::InvalidInput(msg) => msg.clone(),
            FetchError::Transport(_) => "Could not reach the music service.".to_string(),
            FetchError::Http { status, .. } => {
                format!("The music service answered with an error ({}).", status)
            }
            FetchError::Decode(_) => "The music service sent an unexpected reply.".to_string(),
            FetchError::Io { .. } => "Could not save the downloaded file.".to_string(),
        }
    }
}

impl From<BridgeError> for FetchError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Io(source) => FetchError::Io {
                path: PathBuf::new(),
                source,
            },
            other => FetchError::Transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_status() {
        let http = FetchError::Http {
            status: 503,
            message: "busy".to_string(),
        };
        assert_eq!(http.kind(), ErrorKind::Upstream);
        assert_eq!(http.status_code(), Some(503));
        assert!(http.is_retryable());

        let decode = FetchError::Decode("not json".to_string());
        assert_eq!(decode.kind(), ErrorKind::Decode);
        assert_eq!(decode.status_code(), None);
        assert!(!decode.is_retryable());
    }

    #[test]
    fn test_bridge_timeout_maps_to_transport() {
        let err: FetchError = BridgeError::Timeout("deadline".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_user_message_hides_detail() {
        let err = FetchError::Transport("tcp connect error: 10.0.0.3:443".to_string());
        assert!(!err.user_message().contains("10.0.0.3"));
    }
}
