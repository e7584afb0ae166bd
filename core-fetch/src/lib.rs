//! # Resilient Fetch Client
//!
//! HTTP GET and streaming downloads on top of the single-attempt
//! [`HttpClient`](bridge_traits::http::HttpClient) seam:
//!
//! - bounded retries with doubling backoff on transport failures and
//!   non-success statuses
//! - content-type sniffing (`application/json` bodies are parsed, anything
//!   else is handed back as bytes)
//! - downloads streamed to a private `.part` sibling and renamed into place,
//!   so the final path never holds a partial file, even with concurrent
//!   writers
//!
//! ## Usage
//!
//! ```ignore
//! use core_fetch::{FetchBody, FetchClient};
//!
//! let client = FetchClient::new(http, RetryPolicy::default(), downloads_dir);
//! match client.request("https://api.example.com/get_track/abc", &[], &[]).await? {
//!     FetchBody::Json(value) => { /* metadata */ }
//!     FetchBody::Bytes(bytes) => { /* direct media */ }
//! }
//! ```

pub mod atomic;
pub mod client;
pub mod error;
pub mod filename;

pub use atomic::write_bytes_atomically;
pub use client::{DownloadResult, FetchBody, FetchClient};
pub use error::{FetchError, Result};
