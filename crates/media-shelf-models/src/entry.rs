use crate::media::MediaItem;

#[derive(Debug, Clone, PartialEq)]
pub struct TimestampedEntry {
    pub item: MediaItem,
    pub added_at_millis: i64,
}

impl TimestampedEntry {
    pub fn new(item: MediaItem, added_at_millis: i64) -> Self {
        Self { item, added_at_millis }
    }
}

/// Stable sort, newest first. Entries with equal timestamps keep their
/// relative order, so callers that insert at the front win ties.
pub fn sort_newest_first(entries: &mut [TimestampedEntry]) {
    entries.sort_by(|a, b| b.added_at_millis.cmp(&a.added_at_millis));
}
