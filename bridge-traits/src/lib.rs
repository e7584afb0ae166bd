//! # Host Bridge Traits
//!
//! Seams between the trackflow core and the host environment. Each trait is a
//! capability the core needs but whose implementation depends on the platform
//! (or on a test double):
//!
//! - [`HttpClient`](http::HttpClient) - single-attempt HTTP requests and
//!   streaming bodies; retry policy lives above this seam
//! - [`MediaRemuxer`](process::MediaRemuxer) - the external stream-copy tool
//! - [`Clock`](time::Clock) - injectable wall clock for TTL bookkeeping
//!
//! Desktop implementations live in `bridge-desktop`.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map platform errors into it without losing the transport/timeout
//! distinction, since callers decide retry behavior from it.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single instance can be shared
//! behind an `Arc` by every chat session.

pub mod error;
pub mod http;
pub mod process;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, HttpStream, RetryPolicy};
pub use process::{MediaRemuxer, RemuxOutput};
pub use time::{Clock, LogLevel, ManualClock, SystemClock};
