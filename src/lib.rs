//! Workspace umbrella crate.
//!
//! Re-exports the service façade and runtime bootstrap so a host binary can
//! depend on `trackflow-workspace` alone and enable the documented features
//! instead of wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_runtime::{config::EngineConfig, logging};
#[cfg(feature = "desktop-shims")]
pub use core_service::{MusicCore, ServiceError};
