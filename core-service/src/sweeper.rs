//! # Idle-Session Sweep
//!
//! Periodically ends voice-chat sessions nobody is listening to. Every
//! `interval` the sweeper takes the chats with a live session, asks the
//! call-transport collaborator how many listeners each has and how long it
//! has been playing, and ends the call when only the bot is left after the
//! minimum play time.
//!
//! ```ignore
//! let handle = core.start_idle_sweeper(probe);
//! // ...
//! handle.shutdown().await;
//! ```

use async_trait::async_trait;
use core_async::sync::CancellationToken;
use core_async::task::JoinHandle;
use core_library::ChatId;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::sessions::Sessions;
use crate::Result;

/// Snapshot of a live call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
    /// Participants including the bot itself
    pub listeners: u32,
    /// How long the current stream has been playing
    pub played: Duration,
}

/// Call-transport collaborator queried by the sweep.
#[async_trait]
pub trait CallProbe: Send + Sync {
    async fn call_stats(&self, chat_id: ChatId) -> Result<CallStats>;

    async fn end_call(&self, chat_id: ChatId) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub interval: Duration,
    /// Chats probed at once
    pub concurrency: usize,
    pub min_played: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            concurrency: 10,
            min_played: Duration::from_secs(15),
        }
    }
}

/// Tally of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub ended: usize,
    pub failed: usize,
}

enum ChatOutcome {
    Kept,
    Ended,
    Failed,
}

pub struct IdleSweeper {
    sessions: Arc<Sessions>,
    probe: Arc<dyn CallProbe>,
    config: SweeperConfig,
}

impl IdleSweeper {
    pub fn new(sessions: Arc<Sessions>, probe: Arc<dyn CallProbe>, config: SweeperConfig) -> Self {
        Self {
            sessions,
            probe,
            config,
        }
    }

    /// Checks every active chat once.
    #[instrument(skip(self))]
    pub async fn sweep_once(&self) -> SweepReport {
        let chats = self.sessions.queue().active_chat_ids();
        if chats.is_empty() {
            return SweepReport::default();
        }
        debug!(chats = chats.len(), "Sweeping active sessions");

        let outcomes: Vec<ChatOutcome> = stream::iter(chats)
            .map(|chat_id| self.check(chat_id))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut report = SweepReport {
            checked: outcomes.len(),
            ..SweepReport::default()
        };
        for outcome in outcomes {
            match outcome {
                ChatOutcome::Ended => report.ended += 1,
                ChatOutcome::Failed => report.failed += 1,
                ChatOutcome::Kept => {}
            }
        }

        if report.ended > 0 || report.failed > 0 {
            info!(
                checked = report.checked,
                ended = report.ended,
                failed = report.failed,
                "Idle sweep finished"
            );
        }
        report
    }

    async fn check(&self, chat_id: ChatId) -> ChatOutcome {
        let stats = match self.probe.call_stats(chat_id).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "Failed to probe call");
                return ChatOutcome::Failed;
            }
        };

        if stats.listeners > 1 || stats.played < self.config.min_played {
            return ChatOutcome::Kept;
        }

        // A failed hang-up keeps the session so the next sweep retries it.
        if let Err(e) = self.probe.end_call(chat_id).await {
            warn!(chat_id = %chat_id, error = %e, "Failed to end idle call");
            return ChatOutcome::Failed;
        }
        self.sessions.stop(chat_id);
        info!(
            chat_id = %chat_id,
            listeners = stats.listeners,
            played_secs = stats.played.as_secs(),
            "Ended idle call"
        );
        ChatOutcome::Ended
    }

    /// Runs the sweep every `interval` until the returned handle is shut down.
    pub fn spawn(self) -> SweeperHandle {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let interval = self.config.interval;

        let task = core_async::task::spawn(async move {
            loop {
                core_async::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = core_async::time::sleep(interval) => {}
                }
                self.sweep_once().await;
            }
            debug!("Idle sweeper stopped");
        });

        SweeperHandle {
            token,
            task: Some(task),
        }
    }
}

/// Owner of a running sweeper. Dropping it stops the task.
pub struct SweeperHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the sweeper and waits for an in-progress sweep to finish.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Idle sweeper task failed");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
