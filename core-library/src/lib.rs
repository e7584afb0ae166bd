//! # Track Data Model
//!
//! Platform-agnostic records shared by the metadata normalizer, the
//! acquisition pipeline and the playback queue:
//!
//! - [`CanonicalTrack`](models::CanonicalTrack) - normalized search/metadata result
//! - [`ResolvedTrackInfo`](models::ResolvedTrackInfo) - acquisition-ready detail
//! - [`QueueEntry`](models::QueueEntry) - one item in a chat's playback queue
//!
//! Plus the text rules every display-bound string passes through
//! ([`sanitize`]) and the lenient duration parser ([`duration`]).
//!
//! ## Field defaults
//!
//! | Field | Default when upstream omits it |
//! |-------|--------------------------------|
//! | `name` | `"Unknown Track"` |
//! | `artist` | `"Unknown Artist"` |
//! | `album`, `cover_url`, `lyrics` | none |
//! | `year` | none (`0` is treated as none) |
//! | `duration_seconds` | `0` (unknown) |
//! | `platform` | inferred from the source URL, else Spotify |

pub mod duration;
pub mod models;
pub mod sanitize;

pub use duration::{parse_duration, parse_duration_str};
pub use models::{
    is_valid_track_id, CanonicalTrack, ChatId, Platform, QueueEntry, ResolvedTrackInfo, UnknownPlatform,
    UNKNOWN_ARTIST, UNKNOWN_TRACK,
};
pub use sanitize::{sanitize_text, MAX_TEXT_LEN};
