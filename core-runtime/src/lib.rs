//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the trackflow engine:
//! - Logging and tracing infrastructure
//! - Engine configuration (builder and environment loader)
//! - The error taxonomy shared by every crate
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the error classification that
//! callers use to decide between retrying, reporting, and giving up.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, ErrorKind, Result};
