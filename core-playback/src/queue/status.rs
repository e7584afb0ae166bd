//! Short-lived memo of chat invite links and member roles.
//!
//! Only bounds how often the messaging platform is asked; entries are not
//! authoritative and expire after a fixed TTL.

use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_library::ChatId;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(1000);
pub const MAX_CHAT_INVITES: usize = 1000;
pub const MAX_MEMBER_STATUSES: usize = 5000;

/// Role of a user in a chat, as last reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    pub fn is_admin(&self) -> bool {
        matches!(self, MemberStatus::Creator | MemberStatus::Administrator)
    }

    /// Still in the chat, whatever the restrictions.
    pub fn is_present(&self) -> bool {
        !matches!(self, MemberStatus::Left | MemberStatus::Banned)
    }
}

#[derive(Debug, Clone)]
struct Stamped<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// LRU map whose entries expire by wall clock.
struct TtlMap<K: Hash + Eq, V> {
    entries: Mutex<LruCache<K, Stamped<V>>>,
}

impl<K: Hash + Eq, V: Clone> TtlMap<K, V> {
    fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn get(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let mut entries = self.entries.lock();
        let fresh = entries
            .get(key)
            .map(|entry| (entry.expires_at > now).then(|| entry.value.clone()));
        match fresh {
            Some(Some(value)) => Some(value),
            Some(None) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: K, value: V, expires_at: DateTime<Utc>) {
        self.entries.lock().put(key, Stamped { value, expires_at });
    }

    fn remove(&self, key: &K) {
        self.entries.lock().pop(key);
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Invite-link and member-role caches.
pub struct StatusCache {
    invites: TtlMap<ChatId, String>,
    members: TtlMap<(ChatId, i64), MemberStatus>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl StatusCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(clock, DEFAULT_STATUS_TTL, MAX_CHAT_INVITES, MAX_MEMBER_STATUSES)
    }

    pub fn with_limits(
        clock: Arc<dyn Clock>,
        ttl: Duration,
        max_invites: usize,
        max_members: usize,
    ) -> Self {
        Self {
            invites: TtlMap::new(max_invites),
            members: TtlMap::new(max_members),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            clock,
        }
    }

    fn expiry(&self) -> DateTime<Utc> {
        self.clock.now() + self.ttl
    }

    pub fn chat_invite(&self, chat_id: ChatId) -> Option<String> {
        self.invites.get(&chat_id, self.clock.now())
    }

    pub fn set_chat_invite(&self, chat_id: ChatId, link: impl Into<String>) {
        self.invites.put(chat_id, link.into(), self.expiry());
    }

    pub fn forget_chat_invite(&self, chat_id: ChatId) {
        self.invites.remove(&chat_id);
    }

    pub fn member_status(&self, chat_id: ChatId, user_id: i64) -> Option<MemberStatus> {
        self.members.get(&(chat_id, user_id), self.clock.now())
    }

    pub fn set_member_status(&self, chat_id: ChatId, user_id: i64, status: MemberStatus) {
        self.members.put((chat_id, user_id), status, self.expiry());
    }

    pub fn forget_member_status(&self, chat_id: ChatId, user_id: i64) {
        self.members.remove(&(chat_id, user_id));
    }

    /// Number of stored (possibly expired) entries: `(invites, members)`.
    pub fn entry_counts(&self) -> (usize, usize) {
        (self.invites.len(), self.members.len())
    }
}
