//! Per-chat playback queues.

use core_library::{ChatId, QueueEntry};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// State of one chat's playback session.
#[derive(Debug)]
struct ChatQueueState {
    is_active: bool,
    /// Head is the currently playing entry
    queue: VecDeque<QueueEntry>,
}

impl ChatQueueState {
    fn new(is_active: bool) -> Self {
        Self {
            is_active,
            queue: VecDeque::new(),
        }
    }
}

/// Outcome of [`QueueStore::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The head repeats; one loop was consumed.
    Repeat(QueueEntry),
    /// The head was removed; this is the new head, if any.
    Next(Option<QueueEntry>),
}

/// In-memory playback queues for every chat.
///
/// Mutations of one chat are serialized by that chat's own lock, so
/// different chats never contend with each other beyond the short map
/// lookup. The map lock is held while a chat is locked, which keeps
/// [`clear`](Self::clear) linearizable with concurrent mutators.
///
/// No lock is held across an await point; every operation is synchronous.
#[derive(Debug, Default)]
pub struct QueueStore {
    chats: RwLock<HashMap<ChatId, Mutex<ChatQueueState>>>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_chat<R>(&self, chat_id: ChatId, f: impl FnOnce(&mut ChatQueueState) -> R) -> Option<R> {
        let chats = self.chats.read();
        let state = chats.get(&chat_id)?;
        let mut state = state.lock();
        Some(f(&mut state))
    }

    fn with_chat_or_create<R>(
        &self,
        chat_id: ChatId,
        active: bool,
        f: impl FnOnce(&mut ChatQueueState) -> R,
    ) -> R {
        {
            let chats = self.chats.read();
            if let Some(state) = chats.get(&chat_id) {
                return f(&mut state.lock());
            }
        }

        let mut chats = self.chats.write();
        let state = chats.entry(chat_id).or_insert_with(|| {
            debug!(chat_id = %chat_id, "Tracking chat");
            Mutex::new(ChatQueueState::new(active))
        });
        let mut state = state.lock();
        f(&mut state)
    }

    /// Appends a sanitized copy of `entry` and returns what was stored.
    ///
    /// An untracked chat is created active.
    pub fn enqueue(&self, chat_id: ChatId, entry: QueueEntry) -> QueueEntry {
        let entry = entry.sanitized();
        self.with_chat_or_create(chat_id, true, |state| push_entry(chat_id, state, &entry));
        entry
    }

    /// Like [`enqueue`](Self::enqueue), but only when `admit` still holds.
    ///
    /// `admit` runs while the chat is locked, or while the map is locked for
    /// writing when the chat is untracked, so a [`clear`](Self::clear) that
    /// follows a refused admission cannot be undone by this call. A refused
    /// entry leaves an untracked chat untracked.
    pub fn enqueue_if(
        &self,
        chat_id: ChatId,
        entry: QueueEntry,
        admit: impl FnOnce() -> bool,
    ) -> Option<QueueEntry> {
        let entry = entry.sanitized();
        {
            let chats = self.chats.read();
            if let Some(state) = chats.get(&chat_id) {
                let mut state = state.lock();
                if !admit() {
                    return None;
                }
                push_entry(chat_id, &mut state, &entry);
                return Some(entry);
            }
        }

        let mut chats = self.chats.write();
        if !admit() {
            return None;
        }
        let state = chats.entry(chat_id).or_insert_with(|| {
            debug!(chat_id = %chat_id, "Tracking chat");
            Mutex::new(ChatQueueState::new(true))
        });
        push_entry(chat_id, &mut state.lock(), &entry);
        Some(entry)
    }

    /// Currently playing entry.
    pub fn head(&self, chat_id: ChatId) -> Option<QueueEntry> {
        self.with_chat(chat_id, |state| state.queue.front().cloned())
            .flatten()
    }

    /// Entry after the head.
    pub fn next(&self, chat_id: ChatId) -> Option<QueueEntry> {
        self.with_chat(chat_id, |state| state.queue.get(1).cloned())
            .flatten()
    }

    pub fn pop_head(&self, chat_id: ChatId) -> Option<QueueEntry> {
        self.with_chat(chat_id, |state| state.queue.pop_front())
            .flatten()
    }

    /// Removes the entry at `index`; `false` when out of range.
    pub fn remove_at(&self, chat_id: ChatId, index: usize) -> bool {
        self.with_chat(chat_id, |state| state.queue.remove(index).is_some())
            .unwrap_or(false)
    }

    pub fn length(&self, chat_id: ChatId) -> usize {
        self.with_chat(chat_id, |state| state.queue.len())
            .unwrap_or(0)
    }

    /// Ordered snapshot of the queue.
    pub fn list(&self, chat_id: ChatId) -> Vec<QueueEntry> {
        self.with_chat(chat_id, |state| state.queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Remaining repeats of the head entry.
    pub fn get_loop(&self, chat_id: ChatId) -> u32 {
        self.with_chat(chat_id, |state| {
            state.queue.front().map(|entry| entry.loop_count)
        })
        .flatten()
        .unwrap_or(0)
    }

    /// Sets the head's repeat count; `false` when there is no head.
    pub fn set_loop(&self, chat_id: ChatId, count: u32) -> bool {
        self.with_chat(chat_id, |state| match state.queue.front_mut() {
            Some(head) => {
                head.loop_count = count;
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    /// Called when the head finished playing.
    ///
    /// Consumes one repeat if any remain, otherwise drops the head.
    pub fn advance(&self, chat_id: ChatId) -> Advance {
        self.with_chat(chat_id, |state| {
            if let Some(head) = state.queue.front_mut() {
                if head.loop_count > 0 {
                    head.loop_count -= 1;
                    return Advance::Repeat(head.clone());
                }
            }
            state.queue.pop_front();
            Advance::Next(state.queue.front().cloned())
        })
        .unwrap_or(Advance::Next(None))
    }

    /// Marks the session live or idle, tracking the chat if needed.
    pub fn set_active(&self, chat_id: ChatId, active: bool) {
        self.with_chat_or_create(chat_id, active, |state| state.is_active = active);
    }

    pub fn is_active(&self, chat_id: ChatId) -> bool {
        self.with_chat(chat_id, |state| state.is_active)
            .unwrap_or(false)
    }

    /// Whether any state exists for the chat, including an empty queue.
    pub fn is_tracked(&self, chat_id: ChatId) -> bool {
        self.chats.read().contains_key(&chat_id)
    }

    /// Drops all state for the chat.
    pub fn clear(&self, chat_id: ChatId) {
        if self.chats.write().remove(&chat_id).is_some() {
            debug!(chat_id = %chat_id, "Cleared chat state");
        }
    }

    /// Chats with a live session.
    pub fn active_chat_ids(&self) -> HashSet<ChatId> {
        self.chats
            .read()
            .iter()
            .filter(|(_, state)| state.lock().is_active)
            .map(|(chat_id, _)| *chat_id)
            .collect()
    }
}

fn push_entry(chat_id: ChatId, state: &mut ChatQueueState, entry: &QueueEntry) {
    state.queue.push_back(entry.clone());
    debug!(chat_id = %chat_id, track_id = %entry.track_id, position = state.queue.len() - 1, "Enqueued track");
}
