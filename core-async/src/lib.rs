//! Runtime indirection layer for the trackflow crates.
//!
//! Every `core-*` crate reaches the async runtime through this crate instead
//! of depending on Tokio directly, so executor-specific choices (timer,
//! filesystem, process handling) stay in one place.
//!
//! # Modules
//!
//! - `task`: Task spawning and join handles
//! - `time`: Sleep, timeouts, monotonic instants
//! - `sync`: Mutexes, semaphores, cancellation tokens, and [`sync::KeyedMutex`]
//! - `fs` / `io`: Async filesystem and I/O traits
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(10)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

pub mod fs;
pub mod io;
pub mod sync;
pub mod task;
pub mod time;

/// Waits on several branches and runs the first that completes.
pub use tokio::select;
pub use task::spawn;
pub use time::{sleep, Duration, Instant};
