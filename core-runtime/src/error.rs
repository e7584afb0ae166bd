use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Classification shared by every crate error.
///
/// Each crate keeps its own error enum with rich context; `kind()` on those
/// enums maps into this taxonomy so callers can decide policy without
/// matching on crate-specific variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or unsupported input (bad URL, empty query)
    InvalidInput,
    /// Valid request with no upstream match
    NotFound,
    /// Network-level failure, no response received
    Transport,
    /// Non-success HTTP status from upstream
    Upstream,
    /// Response body did not have the expected shape
    Decode,
    /// Missing source, decrypt, repair, or remux failure
    Media,
    /// Local filesystem failure
    Resource,
    /// Abandoned because the owning session stopped
    Cancelled,
}

impl ErrorKind {
    /// Only network and upstream failures are worth another attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transport | ErrorKind::Upstream)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transport => "transport",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Decode => "decode",
            ErrorKind::Media => "media",
            ErrorKind::Resource => "resource",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
