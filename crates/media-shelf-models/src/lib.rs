pub mod document;
pub mod entry;
pub mod identity;
pub mod media;

pub use document::{DecodeError, RemoteDocument};
pub use entry::{sort_newest_first, TimestampedEntry};
pub use identity::{doc_id, ItemKey, MatchPolicy};
pub use media::{Book, MediaItem, MediaKind, Movie, Track};
