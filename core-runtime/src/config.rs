//! # Engine Configuration Module
//!
//! Provides configuration management for the trackflow engine.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! `EngineConfig`. It enforces fail-fast validation so a misconfigured host
//! learns about it at startup rather than on the first acquisition.
//!
//! ## Required Settings
//!
//! - `downloads_dir` - root directory for downloaded and repaired media
//!
//! Everything else has a default. Hosts that configure through the process
//! environment can use [`EngineConfig::from_env`], which honors
//! `DOWNLOADS_DIR`, `API_URL`, `API_KEY` and `FFMPEG_PATH`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::EngineConfig;
//! use std::time::Duration;
//!
//! let config = EngineConfig::builder()
//!     .downloads_dir("/var/lib/trackflow/downloads")
//!     .api_key("secret")
//!     .remux_timeout(Duration::from_secs(60))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::EngineConfig;
//!
//! // Missing downloads directory
//! let config = EngineConfig::builder()
//!     .build()
//!     .expect("Should fail - downloads_dir is required");
//! ```

use crate::error::{Error, Result};
use bridge_traits::http::RetryPolicy;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Upstream metadata/media API used when none is configured.
pub const DEFAULT_API_URL: &str = "https://billa-api.vercel.app";

/// Remux executable used when none is configured.
pub const DEFAULT_REMUX_PROGRAM: &str = "ffmpeg";

/// Engine configuration.
///
/// Use [`EngineConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct EngineConfig {
    /// Root directory for downloads, intermediates and final artifacts
    pub downloads_dir: PathBuf,

    /// Base URL of the upstream metadata/media API
    pub api_url: String,

    /// Bearer token for the upstream API
    pub api_key: Option<String>,

    /// Timeout for metadata calls
    pub metadata_timeout: Duration,

    /// Timeout for media downloads
    pub download_timeout: Duration,

    /// Retry policy shared by metadata calls and downloads
    pub retry: RetryPolicy,

    /// Redirects to follow; zero disables redirect following
    pub max_redirects: usize,

    /// Upper bound on acquisitions running at once
    pub max_concurrent_acquisitions: usize,

    /// Upper bound on a single remux invocation
    pub remux_timeout: Duration,

    /// Remux executable name or path
    pub remux_program: String,

    /// Period of the idle-session sweep
    pub sweep_interval: Duration,

    /// Chats probed in parallel by one sweep
    pub sweep_concurrency: usize,

    /// Sessions that played for less than this are left alone by the sweep
    pub min_played_before_idle_end: Duration,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("downloads_dir", &self.downloads_dir)
            .field("api_url", &self.api_url)
            .field(
                "api_key",
                &self
                    .api_key
                    .as_deref()
                    .map(|key| crate::logging::redact_if_sensitive("api_key", key)),
            )
            .field("metadata_timeout", &self.metadata_timeout)
            .field("download_timeout", &self.download_timeout)
            .field("retry", &self.retry)
            .field("max_redirects", &self.max_redirects)
            .field(
                "max_concurrent_acquisitions",
                &self.max_concurrent_acquisitions,
            )
            .field("remux_timeout", &self.remux_timeout)
            .field("remux_program", &self.remux_program)
            .field("sweep_interval", &self.sweep_interval)
            .field("sweep_concurrency", &self.sweep_concurrency)
            .field(
                "min_played_before_idle_end",
                &self.min_played_before_idle_end,
            )
            .finish()
    }
}

impl EngineConfig {
    /// Creates a new builder for constructing an `EngineConfig`.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Builds a configuration from the process environment.
    ///
    /// `DOWNLOADS_DIR` is required; `API_URL`, `API_KEY` and `FFMPEG_PATH`
    /// override their defaults when set and non-empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(dir) = get("DOWNLOADS_DIR") {
            builder = builder.downloads_dir(dir);
        }
        if let Some(url) = get("API_URL") {
            builder = builder.api_url(url);
        }
        if let Some(key) = get("API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(program) = get("FFMPEG_PATH") {
            builder = builder.remux_program(program);
        }
        builder.build()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.downloads_dir.as_os_str().is_empty() {
            return Err(Error::Config(
                "Downloads directory cannot be empty".to_string(),
            ));
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "API URL must start with http:// or https:// (got '{}')",
                self.api_url
            )));
        }

        if self.metadata_timeout.is_zero() || self.download_timeout.is_zero() {
            return Err(Error::Config(
                "Network timeouts must be greater than zero".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "Retry policy needs at least one attempt".to_string(),
            ));
        }

        if self.max_concurrent_acquisitions == 0 {
            return Err(Error::Config(
                "max_concurrent_acquisitions must be at least 1".to_string(),
            ));
        }

        if self.remux_timeout.is_zero() {
            return Err(Error::Config(
                "Remux timeout must be greater than zero. \
                 An unbounded remux would leak an acquisition slot."
                    .to_string(),
            ));
        }

        if self.remux_program.trim().is_empty() {
            return Err(Error::Config(
                "Remux program cannot be empty. Set FFMPEG_PATH or use .remux_program()."
                    .to_string(),
            ));
        }

        if self.sweep_interval.is_zero() || self.sweep_concurrency == 0 {
            return Err(Error::Config(
                "Idle sweep needs a non-zero interval and concurrency".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`EngineConfig`].
#[derive(Default)]
pub struct EngineConfigBuilder {
    downloads_dir: Option<PathBuf>,
    api_url: Option<String>,
    api_key: Option<String>,
    metadata_timeout: Option<Duration>,
    download_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    max_redirects: Option<usize>,
    max_concurrent_acquisitions: Option<usize>,
    remux_timeout: Option<Duration>,
    remux_program: Option<String>,
    sweep_interval: Option<Duration>,
    sweep_concurrency: Option<usize>,
    min_played_before_idle_end: Option<Duration>,
}

impl EngineConfigBuilder {
    /// Sets the downloads directory (required).
    pub fn downloads_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.downloads_dir = Some(path.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.api_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = Some(timeout);
        self
    }

    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn max_redirects(mut self, redirects: usize) -> Self {
        self.max_redirects = Some(redirects);
        self
    }

    pub fn max_concurrent_acquisitions(mut self, limit: usize) -> Self {
        self.max_concurrent_acquisitions = Some(limit);
        self
    }

    pub fn remux_timeout(mut self, timeout: Duration) -> Self {
        self.remux_timeout = Some(timeout);
        self
    }

    pub fn remux_program(mut self, program: impl Into<String>) -> Self {
        self.remux_program = Some(program.into());
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    pub fn sweep_concurrency(mut self, limit: usize) -> Self {
        self.sweep_concurrency = Some(limit);
        self
    }

    pub fn min_played_before_idle_end(mut self, played: Duration) -> Self {
        self.min_played_before_idle_end = Some(played);
        self
    }

    /// Builds the final `EngineConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `downloads_dir` is missing or any value
    /// fails [`EngineConfig::validate`].
    pub fn build(self) -> Result<EngineConfig> {
        let downloads_dir = self.downloads_dir.ok_or_else(|| {
            Error::Config(
                "Downloads directory is required. Use .downloads_dir() or set DOWNLOADS_DIR."
                    .to_string(),
            )
        })?;

        let config = EngineConfig {
            downloads_dir,
            api_url: self
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: self.api_key,
            metadata_timeout: self.metadata_timeout.unwrap_or(Duration::from_secs(30)),
            download_timeout: self.download_timeout.unwrap_or(Duration::from_secs(120)),
            retry: self.retry.unwrap_or_default(),
            max_redirects: self.max_redirects.unwrap_or(0),
            max_concurrent_acquisitions: self.max_concurrent_acquisitions.unwrap_or(10),
            remux_timeout: self.remux_timeout.unwrap_or(Duration::from_secs(120)),
            remux_program: self
                .remux_program
                .unwrap_or_else(|| DEFAULT_REMUX_PROGRAM.to_string()),
            sweep_interval: self.sweep_interval.unwrap_or(Duration::from_secs(60)),
            sweep_concurrency: self.sweep_concurrency.unwrap_or(10),
            min_played_before_idle_end: self
                .min_played_before_idle_end
                .unwrap_or(Duration::from_secs(15)),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> EngineConfigBuilder {
        EngineConfig::builder().downloads_dir("/tmp/trackflow")
    }

    #[test]
    fn test_builder_defaults() {
        let config = base().build().unwrap();

        assert_eq!(config.downloads_dir, PathBuf::from("/tmp/trackflow"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_key, None);
        assert_eq!(config.metadata_timeout, Duration::from_secs(30));
        assert_eq!(config.download_timeout, Duration::from_secs(120));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
        assert_eq!(config.max_redirects, 0);
        assert_eq!(config.max_concurrent_acquisitions, 10);
        assert_eq!(config.remux_timeout, Duration::from_secs(120));
        assert_eq!(config.remux_program, "ffmpeg");
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.sweep_concurrency, 10);
        assert_eq!(config.min_played_before_idle_end, Duration::from_secs(15));
    }

    #[test]
    fn test_builder_requires_downloads_dir() {
        let result = EngineConfig::builder().build();

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("Downloads directory is required")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_api_url_trailing_slash_is_trimmed() {
        let config = base().api_url("https://api.example.com/").build().unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
    }

    #[test]
    fn test_validate_rejects_non_http_api_url() {
        let result = base().api_url("ftp://api.example.com").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_remux_timeout() {
        let result = base().remux_timeout(Duration::ZERO).build();

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("Remux timeout")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        assert!(base().max_concurrent_acquisitions(0).build().is_err());
        assert!(base().sweep_concurrency(0).build().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert!(base().retry(policy).build().is_err());
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let env: HashMap<&str, &str> = [
            ("DOWNLOADS_DIR", "/srv/music"),
            ("API_URL", "https://mirror.example.com"),
            ("API_KEY", "k-123"),
            ("FFMPEG_PATH", "/opt/ffmpeg/bin/ffmpeg"),
        ]
        .into_iter()
        .collect();

        let config =
            EngineConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.downloads_dir, PathBuf::from("/srv/music"));
        assert_eq!(config.api_url, "https://mirror.example.com");
        assert_eq!(config.api_key.as_deref(), Some("k-123"));
        assert_eq!(config.remux_program, "/opt/ffmpeg/bin/ffmpeg");
    }

    #[test]
    fn test_from_lookup_ignores_blank_values() {
        let env: HashMap<&str, &str> = [("DOWNLOADS_DIR", "/srv/music"), ("API_KEY", "  ")]
            .into_iter()
            .collect();

        let config =
            EngineConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_key, None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_from_lookup_without_downloads_dir_fails() {
        assert!(EngineConfig::from_lookup(|_| None).is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = base().api_key("super-secret").build().unwrap();
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = base().build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.downloads_dir, config.downloads_dir);
    }
}
