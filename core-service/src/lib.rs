//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, the remux
//! tool, a clock) into the shared core and exposes [`MusicCore`], which runs
//! a chat request end to end:
//!
//! ```text
//! query -> resolve/search -> detail -> acquire -> enqueue
//! ```
//!
//! Desktop hosts typically enable the `desktop-shims` feature (which depends
//! on `bridge-desktop`) and call [`bootstrap_desktop`].

pub mod error;
pub mod sessions;
pub mod sweeper;

pub use error::{Result, ServiceError};
pub use sessions::Sessions;
pub use sweeper::{CallProbe, CallStats, IdleSweeper, SweepReport, SweeperConfig, SweeperHandle};

use std::future::Future;
use std::sync::Arc;

use bridge_traits::{http::HttpClient, process::MediaRemuxer, time::Clock};
use core_async::sync::CancellationToken;
use core_fetch::FetchClient;
use core_library::{ChatId, QueueEntry};
use core_metadata::{MetadataError, TrackApi};
use core_playback::{AcquireConfig, PlaybackError, QueueStore, StatusCache, TrackAcquirer};
use core_runtime::config::EngineConfig;
use tracing::{info, instrument};

#[cfg(feature = "desktop-shims")]
use bridge_desktop::{FfmpegRemuxer, HttpClientSettings, ReqwestHttpClient};

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub remuxer: Arc<dyn MediaRemuxer>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        remuxer: Arc<dyn MediaRemuxer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http_client,
            remuxer,
            clock,
        }
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct MusicCore {
    config: Arc<EngineConfig>,
    api: Arc<TrackApi>,
    acquirer: Arc<TrackAcquirer>,
    queue: Arc<QueueStore>,
    status: Arc<StatusCache>,
    sessions: Arc<Sessions>,
}

impl MusicCore {
    /// Create a new core from a validated configuration and bridges.
    pub fn new(config: EngineConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let fetch = FetchClient::new(
            deps.http_client,
            config.retry.clone(),
            config.downloads_dir.clone(),
        )
        .with_timeouts(config.metadata_timeout, config.download_timeout);

        let api = TrackApi::from_config(fetch.clone(), &config);
        let acquirer = TrackAcquirer::new(fetch, deps.remuxer, AcquireConfig::from_engine(&config));
        let queue = Arc::new(QueueStore::new());
        let sessions = Arc::new(Sessions::new(queue.clone()));

        info!(
            downloads_dir = %config.downloads_dir.display(),
            api_url = %config.api_url,
            "Music core initialized"
        );

        Ok(Self {
            api: Arc::new(api),
            acquirer: Arc::new(acquirer),
            queue,
            status: Arc::new(StatusCache::new(deps.clock)),
            sessions,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn api(&self) -> &TrackApi {
        &self.api
    }

    pub fn acquirer(&self) -> &TrackAcquirer {
        &self.acquirer
    }

    /// Queue store read and advanced by the audio-transport collaborator.
    pub fn queue(&self) -> &Arc<QueueStore> {
        &self.queue
    }

    pub fn status_cache(&self) -> &StatusCache {
        &self.status
    }

    /// Resolves `query`, makes its first track playable and appends it to
    /// the chat's queue.
    ///
    /// Returns the entry as stored. Fails with `Cancelled` when
    /// [`stop`](Self::stop) is called for the chat while this runs.
    #[instrument(skip(self, query, requested_by), fields(chat_id = %chat_id))]
    pub async fn play(
        &self,
        chat_id: ChatId,
        query: &str,
        requested_by: &str,
        is_video: bool,
    ) -> Result<QueueEntry> {
        let token = self.sessions.token(chat_id);

        let tracks = cancellable(&token, async { Ok(self.api.search(query).await?) }).await?;
        let track = tracks
            .into_iter()
            .next()
            .ok_or_else(|| MetadataError::NotFound(query.to_string()))?;

        let info = cancellable(&token, async { Ok(self.api.detail(&track.id).await?) }).await?;
        let path = self.acquirer.acquire_cancellable(&info, &token).await?;

        let entry = QueueEntry::new(&track, requested_by)
            .with_file_path(path)
            .with_video(is_video);
        // Admission is checked under the queue lock so a concurrent stop
        // either refuses this entry or clears it afterwards.
        let entry = self
            .queue
            .enqueue_if(chat_id, entry, || !token.is_cancelled())
            .ok_or(PlaybackError::Cancelled)?;
        info!(track_id = %entry.track_id, position = self.queue.length(chat_id), "Track queued");
        Ok(entry)
    }

    /// Cancels the chat's in-flight requests and drops its queue.
    pub fn stop(&self, chat_id: ChatId) {
        self.sessions.stop(chat_id);
    }

    /// Starts the idle-session sweep against `probe`, configured from the
    /// engine settings.
    pub fn start_idle_sweeper(&self, probe: Arc<dyn CallProbe>) -> SweeperHandle {
        let config = SweeperConfig {
            interval: self.config.sweep_interval,
            concurrency: self.config.sweep_concurrency,
            min_played: self.config.min_played_before_idle_end,
        };
        IdleSweeper::new(self.sessions.clone(), probe, config).spawn()
    }
}

async fn cancellable<T>(
    token: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    core_async::select! {
        biased;
        _ = token.cancelled() => Err(PlaybackError::Cancelled.into()),
        result = work => result,
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Uses reqwest for HTTP, the configured ffmpeg binary for remuxing and the
/// system clock.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::config::EngineConfig;
///
/// let config = EngineConfig::from_env()?;
/// let _core = core_service::bootstrap_desktop(config)?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(config: EngineConfig) -> Result<MusicCore> {
    let settings = HttpClientSettings {
        timeout: config.download_timeout,
        max_redirects: config.max_redirects,
        ..HttpClientSettings::default()
    };
    let http = ReqwestHttpClient::with_settings(settings)
        .map_err(|err| ServiceError::InitializationFailed(err.to_string()))?;
    let remuxer = FfmpegRemuxer::new(config.remux_program.clone());

    let deps = CoreDependencies::new(
        Arc::new(http),
        Arc::new(remuxer),
        Arc::new(bridge_traits::time::SystemClock),
    );
    MusicCore::new(config, deps)
}
