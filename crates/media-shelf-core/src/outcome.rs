/// Result of [`FavoritesStore::load`](crate::FavoritesStore::load). Failures
/// are logged and reported here instead of being returned as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { loaded: usize, skipped: usize },
    NoSession,
    Failed(String),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added { added_at_millis: i64 },
    Removed,
    NoSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    /// `moved` is true when an earlier entry for the item was replaced.
    Recorded { added_at_millis: i64, moved: bool },
    NoSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared { removed: usize },
    NoSession,
    Failed(String),
}
