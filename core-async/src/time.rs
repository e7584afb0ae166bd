//! Time-related abstractions.
//!
//! Backed by `tokio::time`, so tests can pause and auto-advance the clock
//! (`#[tokio::test(start_paused = true)]`) and still exercise real backoff
//! code paths.
//!
//! ```rust
//! use core_async::time::{sleep, Duration, Instant};
//!
//! async fn example() {
//!     let start = Instant::now();
//!     sleep(Duration::from_millis(5)).await;
//!     assert!(start.elapsed() >= Duration::from_millis(5));
//! }
//! ```

pub use tokio::time::{interval, sleep, timeout, Instant, Interval, MissedTickBehavior};

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Error returned by [`timeout`] when the deadline elapses.
pub use tokio::time::error::Elapsed;
