//! # Track Acquisition
//!
//! Turns a [`ResolvedTrackInfo`] into a playable file in the downloads
//! directory:
//!
//! ```text
//! CheckExisting -> Download -> [Decrypt -> RepairContainer -> Remux] -> Cleanup -> Done
//! ```
//!
//! The bracketed stages only run for encrypted tracks. Any stage can fail;
//! intermediate files are removed on every path and the final artifact only
//! appears through an atomic rename.
//!
//! Acquisitions are serialized per track id and bounded globally by a
//! semaphore, so a second caller for the same track waits for the first and
//! reuses its output.

pub mod decrypt;
pub mod ogg;

use bridge_traits::error::BridgeError;
use bridge_traits::process::MediaRemuxer;
use core_async::fs;
use core_async::sync::{CancellationToken, KeyedMutex, Semaphore};
use core_async::time::timeout;
use core_fetch::FetchClient;
use core_library::{is_valid_track_id, ResolvedTrackInfo};
use core_runtime::config::EngineConfig;
use core_runtime::logging::strip_path;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{PlaybackError, Result};
use decrypt::{decrypt_file, TrackKey};

/// Pipeline stages, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireStage {
    CheckExisting,
    Download,
    Decrypt,
    RepairContainer,
    Remux,
    Cleanup,
}

/// Tunables for [`TrackAcquirer`].
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    pub downloads_dir: PathBuf,
    /// Upper bound for one remux invocation
    pub remux_timeout: Duration,
    /// Acquisitions allowed in flight at once
    pub max_concurrent: usize,
}

impl AcquireConfig {
    pub fn new(downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
            remux_timeout: Duration::from_secs(120),
            max_concurrent: 10,
        }
    }

    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            downloads_dir: config.downloads_dir.clone(),
            remux_timeout: config.remux_timeout,
            max_concurrent: config.max_concurrent_acquisitions,
        }
    }

    pub fn with_remux_timeout(mut self, timeout: Duration) -> Self {
        self.remux_timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = limit.max(1);
        self
    }
}

/// File names used for one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFiles {
    pub output: PathBuf,
    pub encrypted: PathBuf,
    pub decrypted: PathBuf,
    pub remuxed: PathBuf,
}

impl TrackFiles {
    pub fn new(dir: &Path, track_id: &str, encrypted: bool) -> Self {
        let output = if encrypted {
            format!("{}.ogg", track_id)
        } else {
            format!("{}.mp3", track_id)
        };
        Self {
            output: dir.join(output),
            encrypted: dir.join(format!("{}.encrypted.ogg", track_id)),
            decrypted: dir.join(format!("{}.decrypted.ogg", track_id)),
            remuxed: dir.join(format!("{}.remux.ogg", track_id)),
        }
    }

    /// Everything but the output. In-progress download parts clean up
    /// after themselves.
    fn intermediates(&self) -> [&Path; 3] {
        [&self.encrypted, &self.decrypted, &self.remuxed]
    }
}

/// Downloads, decrypts and repairs tracks into the downloads directory.
pub struct TrackAcquirer {
    fetch: FetchClient,
    remuxer: Arc<dyn MediaRemuxer>,
    config: AcquireConfig,
    permits: Arc<Semaphore>,
    in_flight: KeyedMutex<String>,
}

impl TrackAcquirer {
    pub fn new(fetch: FetchClient, remuxer: Arc<dyn MediaRemuxer>, config: AcquireConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            fetch,
            remuxer,
            config,
            permits,
            in_flight: KeyedMutex::new(),
        }
    }

    pub fn config(&self) -> &AcquireConfig {
        &self.config
    }

    /// Final artifact path for `info`, whether or not it exists yet.
    pub fn output_path(&self, info: &ResolvedTrackInfo) -> PathBuf {
        TrackFiles::new(&self.config.downloads_dir, info.id(), info.is_encrypted()).output
    }

    /// Local playable file for `info`.
    ///
    /// Returns immediately when the artifact already exists.
    pub async fn acquire(&self, info: &ResolvedTrackInfo) -> Result<PathBuf> {
        self.acquire_cancellable(info, &CancellationToken::new())
            .await
    }

    /// Like [`acquire`](Self::acquire), abandoned when `cancel` fires.
    ///
    /// Intermediate files are cleaned up either way. An artifact that was
    /// completed before cancellation stays on disk for later reuse but is
    /// not returned.
    #[instrument(skip(self, info, cancel), fields(track_id = %info.id()))]
    pub async fn acquire_cancellable(
        &self,
        info: &ResolvedTrackInfo,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let track_id = info.id();
        if !is_valid_track_id(track_id) {
            return Err(PlaybackError::InvalidTrack(track_id.to_string()));
        }

        debug!(stage = ?AcquireStage::CheckExisting);
        if let Some(local) = &info.local_file {
            if exists(local).await {
                debug!(file = %strip_path(&local.to_string_lossy()), "Using media stored during lookup");
                return Ok(local.clone());
            }
        }

        let files = TrackFiles::new(&self.config.downloads_dir, track_id, info.is_encrypted());
        if exists(&files.output).await {
            info!(file = %strip_path(&files.output.to_string_lossy()), "Found existing file");
            return Ok(files.output);
        }

        let cdn_url = match info.cdn_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => {
                warn!("Missing CDN URL");
                return Err(PlaybackError::MissingSource(track_id.to_string()));
            }
        };

        let key = match &info.decryption_key {
            Some(hex_key) if info.is_encrypted() => Some(TrackKey::from_hex(track_id, hex_key)?),
            _ => None,
        };

        let _guard = until_cancelled(cancel, async {
            Ok(self.in_flight.lock(track_id.to_string()).await)
        })
        .await?;

        // Another caller may have finished while we waited.
        if exists(&files.output).await {
            debug!("Reusing output of concurrent acquisition");
            return Ok(files.output);
        }

        let _permit = until_cancelled(cancel, async {
            self.permits
                .acquire()
                .await
                .map_err(|_| PlaybackError::PoolClosed)
        })
        .await?;

        let result = until_cancelled(cancel, self.run(cdn_url, key.as_ref(), &files)).await;

        debug!(stage = ?AcquireStage::Cleanup);
        cleanup(&files).await;

        match result {
            Ok(()) => {
                info!(file = %strip_path(&files.output.to_string_lossy()), "Successfully processed track");
                Ok(files.output)
            }
            Err(PlaybackError::Cancelled) => {
                info!("Acquisition cancelled");
                Err(PlaybackError::Cancelled)
            }
            Err(e) => {
                error!(error = %e, "Error processing track");
                Err(e)
            }
        }
    }

    async fn run(&self, cdn_url: &str, key: Option<&TrackKey>, files: &TrackFiles) -> Result<()> {
        debug!(stage = ?AcquireStage::Download, encrypted = key.is_some());
        let Some(key) = key else {
            self.fetch
                .download_to(cdn_url, Some(&files.output), false)
                .await?;
            return Ok(());
        };

        self.fetch
            .download_to(cdn_url, Some(&files.encrypted), true)
            .await?;

        debug!(stage = ?AcquireStage::Decrypt);
        decrypt_file(key, &files.encrypted, &files.decrypted).await?;

        debug!(stage = ?AcquireStage::RepairContainer);
        ogg::repair_file(&files.decrypted).await?;

        debug!(stage = ?AcquireStage::Remux);
        self.remux(&files.decrypted, &files.remuxed).await?;

        fs::rename(&files.remuxed, &files.output)
            .await
            .map_err(|e| PlaybackError::io(&files.output, e))
    }

    async fn remux(&self, input: &Path, output: &Path) -> Result<()> {
        let limit = self.config.remux_timeout;
        let outcome = timeout(limit, self.remuxer.remux(input, output))
            .await
            .map_err(|_| {
                warn!(timeout_secs = limit.as_secs(), "Remux timed out");
                PlaybackError::RemuxTimeout(limit)
            })?
            .map_err(|e| match e {
                BridgeError::NotAvailable(msg) => PlaybackError::RemuxUnavailable(msg),
                BridgeError::Io(source) => PlaybackError::io(input, source),
                other => PlaybackError::RemuxUnavailable(other.to_string()),
            })?;

        if !outcome.success() {
            error!(code = ?outcome.exit_code, stderr = %outcome.stderr.trim(), "Remux failed");
            return Err(PlaybackError::Remux {
                code: outcome.exit_code,
                stderr: outcome.stderr.trim().to_string(),
            });
        }

        if !exists(output).await {
            return Err(PlaybackError::Remux {
                code: outcome.exit_code,
                stderr: "remux reported success but wrote no output".to_string(),
            });
        }
        Ok(())
    }
}

/// Runs `work` unless `cancel` fires first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    core_async::select! {
        biased;
        _ = cancel.cancelled() => Err(PlaybackError::Cancelled),
        result = work => result,
    }
}

async fn cleanup(files: &TrackFiles) {
    for path in files.intermediates() {
        match fs::remove_file(path).await {
            Ok(()) => debug!(file = %strip_path(&path.to_string_lossy()), "Removed intermediate file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                file = %strip_path(&path.to_string_lossy()),
                error = %e,
                "Error removing intermediate file"
            ),
        }
    }
}

async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}
