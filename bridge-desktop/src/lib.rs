//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (single attempt, no implicit redirects)
//! - `MediaRemuxer` spawning `ffmpeg` through `tokio::process`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FfmpegRemuxer, HttpClientSettings, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http = ReqwestHttpClient::with_settings(HttpClientSettings::default())?;
//!     let remuxer = FfmpegRemuxer::new("ffmpeg");
//!     // hand both to the acquisition pipeline
//!     Ok(())
//! }
//! ```

mod http;
mod process;

pub use http::{HttpClientSettings, ReqwestHttpClient};
pub use process::FfmpegRemuxer;
