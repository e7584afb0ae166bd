//! Synchronization primitives.
//!
//! Re-exports the async-aware `tokio::sync` primitives and
//! `tokio_util`'s [`CancellationToken`], and adds [`KeyedMutex`], an async
//! mutex keyed by an arbitrary value so that work for one key (for example a
//! track id) is serialized while work for different keys proceeds in
//! parallel.
//!
//! ```rust
//! use core_async::sync::{Mutex, RwLock};
//!
//! async fn example() {
//!     let mutex = Mutex::new(42);
//!     let mut guard = mutex.lock().await;
//!     *guard += 1;
//!     drop(guard);
//!
//!     let rwlock = RwLock::new(vec![1, 2, 3]);
//!     assert_eq!(rwlock.read().await.len(), 3);
//! }
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, OwnedMutexGuard,
    OwnedSemaphorePermit, RwLock, Semaphore, SemaphorePermit,
};
pub use tokio_util::sync::CancellationToken;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

type Slots<K> = Arc<std::sync::Mutex<HashMap<K, Arc<Mutex<()>>>>>;

/// An async mutex per key.
///
/// Slots are created on first use and dropped again once the last guard or
/// waiter for that key goes away, so the map only ever holds keys that are
/// currently contended.
///
/// ```rust
/// use core_async::sync::KeyedMutex;
///
/// async fn example(locks: &KeyedMutex<String>) {
///     let _guard = locks.lock("track-1".to_string()).await;
///     // exclusive section for "track-1"
/// }
/// ```
pub struct KeyedMutex<K> {
    slots: Slots<K>,
}

impl<K> KeyedMutex<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    /// Waits until the exclusive section for `key` is free and enters it.
    pub async fn lock(&self, key: K) -> KeyedGuard<K> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                slots
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let guard = slot.lock_owned().await;

        KeyedGuard {
            key,
            slots: Arc::clone(&self.slots),
            guard: Some(guard),
        }
    }

    /// Number of keys that currently hold or await a guard.
    pub fn active_keys(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl<K> Default for KeyedMutex<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Guard returned by [`KeyedMutex::lock`]; releases the key on drop.
pub struct KeyedGuard<K>
where
    K: Eq + Hash,
{
    key: K,
    slots: Slots<K>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> KeyedGuard<K>
where
    K: Eq + Hash,
{
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K> Drop for KeyedGuard<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        // One reference lives in the map and one inside our owned guard.
        let unused = slots
            .get(&self.key)
            .map(|slot| Arc::strong_count(slot) <= 2)
            .unwrap_or(false);
        if unused {
            slots.remove(&self.key);
        }
        self.guard.take();
    }
}
