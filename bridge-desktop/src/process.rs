//! Remuxer backed by an `ffmpeg` executable.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    process::{MediaRemuxer, RemuxOutput},
};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Runs `<program> -i <input> -c copy <output>`.
///
/// The child is killed if the remux future is dropped, so wrapping the call in
/// a timeout actually stops the process.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    program: OsString,
}

impl FfmpegRemuxer {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-hide_banner")
            .args(["-loglevel", "error"])
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c", "copy"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for FfmpegRemuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl MediaRemuxer for FfmpegRemuxer {
    #[instrument(skip(self), fields(program = ?self.program))]
    async fn remux(&self, input: &Path, output: &Path) -> Result<RemuxOutput> {
        let result = self.command(input, output).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::NotAvailable(format!(
                    "remux program {:?} not found",
                    self.program
                ))
            } else {
                BridgeError::Io(e)
            }
        })?;

        let output = RemuxOutput {
            exit_code: result.status.code(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        };
        debug!(exit_code = ?output.exit_code, "Remux finished");
        Ok(output)
    }
}
