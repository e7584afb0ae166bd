//! External Process Abstractions
//!
//! The acquisition pipeline hands the repaired container to an external
//! stream-copy tool. Its exit status is the only success signal; stderr is
//! kept for diagnostics.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// Outcome of one remux invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemuxOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Captured stderr (lossy UTF-8)
    pub stderr: String,
}

impl RemuxOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Stream-copy remux of an audio container (no re-encode).
///
/// `Err` means the tool could not be run at all; a tool that ran and failed
/// is reported through [`RemuxOutput::exit_code`]. Implementations must stop
/// the child process when the returned future is dropped so callers can bound
/// it with a timeout.
#[async_trait]
pub trait MediaRemuxer: Send + Sync {
    async fn remux(&self, input: &Path, output: &Path) -> Result<RemuxOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remux_output_success() {
        let ok = RemuxOutput {
            exit_code: Some(0),
            stderr: String::new(),
        };
        let failed = RemuxOutput {
            exit_code: Some(1),
            stderr: "Invalid data found when processing input".to_string(),
        };
        let killed = RemuxOutput {
            exit_code: None,
            stderr: String::new(),
        };

        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }
}
