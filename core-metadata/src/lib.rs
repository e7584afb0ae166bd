//! # Platform Metadata Normalizer
//!
//! Turns references to tracks on supported streaming platforms into
//! [`CanonicalTrack`](core_library::CanonicalTrack) and
//! [`ResolvedTrackInfo`](core_library::ResolvedTrackInfo) records.
//!
//! ## Overview
//!
//! - [`patterns`] - per-platform URL shapes and query sanitization
//! - [`response`] - one decoding step from a fetch body into the tagged
//!   [`ApiResponse`](response::ApiResponse)
//! - [`api`] - [`TrackApi`](api::TrackApi): `validate`, `resolve`, `search`,
//!   `detail` against the upstream metadata API
//!
//! All free text is sanitized before it is placed in a record.

pub mod api;
pub mod error;
pub mod patterns;
pub mod response;

pub use api::TrackApi;
pub use error::{MetadataError, Result};
pub use patterns::{sanitize_query, validate_url};
pub use response::ApiResponse;
