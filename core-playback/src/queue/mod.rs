//! # Playback Queue Cache
//!
//! [`QueueStore`] owns every chat's queue and activity flag; the transport
//! collaborator reads the head and reports completion through
//! [`QueueStore::advance`]. [`StatusCache`] memoizes platform status
//! lookups for a short time.

pub mod status;
pub mod store;

pub use status::{MemberStatus, StatusCache};
pub use store::{Advance, QueueStore};
