//! Per-chat cancellation scopes.

use core_async::sync::CancellationToken;
use core_library::ChatId;
use core_playback::QueueStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Tracks one cancellation token per chat with work in flight.
///
/// Stopping a chat cancels its token and drops its queue state; the next
/// request for that chat starts a fresh scope.
pub struct Sessions {
    queue: Arc<QueueStore>,
    tokens: Mutex<HashMap<ChatId, CancellationToken>>,
}

impl Sessions {
    pub fn new(queue: Arc<QueueStore>) -> Self {
        Self {
            queue,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn queue(&self) -> &Arc<QueueStore> {
        &self.queue
    }

    /// Token for the chat's current scope, created on first use.
    pub fn token(&self, chat_id: ChatId) -> CancellationToken {
        self.tokens.lock().entry(chat_id).or_default().clone()
    }

    /// Cancels in-flight work for the chat and clears its queue.
    pub fn stop(&self, chat_id: ChatId) {
        let token = self.tokens.lock().remove(&chat_id);
        if let Some(token) = token {
            token.cancel();
        }
        self.queue.clear(chat_id);
        info!(chat_id = %chat_id, "Session stopped");
    }

    pub fn has_scope(&self, chat_id: ChatId) -> bool {
        self.tokens.lock().contains_key(&chat_id)
    }
}
