//! # Playback Module
//!
//! Everything between a resolved track and the audio transport.
//!
//! ## Overview
//!
//! This module handles:
//! - Acquisition of playable files, including AES-CTR decryption and Ogg
//!   header repair for encrypted sources ([`acquire`])
//! - The per-chat playback queue and short-TTL status caches ([`queue`])

pub mod acquire;
pub mod error;
pub mod queue;

pub use acquire::{AcquireConfig, AcquireStage, TrackAcquirer};
pub use error::{PlaybackError, Result};
pub use queue::{Advance, MemberStatus, QueueStore, StatusCache};
