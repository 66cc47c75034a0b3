use serde::{Deserialize, Serialize};
use std::fmt;

use crate::media::{MediaItem, MediaKind};

/// Document id for one item inside a user collection: `"{kind}_{id}"`.
///
/// Both stores derive ids through this function. Changing the format orphans
/// every document already written.
pub fn doc_id(kind: MediaKind, id: &str) -> String {
    format!("{}_{}", kind.as_str(), id)
}

/// `(kind, id)` identity of a media item, ignoring display fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub kind: MediaKind,
    pub id: String,
}

impl ItemKey {
    pub fn new(kind: MediaKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    pub fn doc_id(&self) -> String {
        doc_id(self.kind, &self.id)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.doc_id())
    }
}

/// How the stores decide that two items are "the same" when checking
/// favorites and collapsing recently-viewed duplicates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Same kind and backing id.
    #[default]
    Key,
    /// Every field equal. A retitled or re-postered item no longer matches
    /// its earlier entry.
    Structural,
}

impl MatchPolicy {
    pub fn matches(&self, a: &MediaItem, b: &MediaItem) -> bool {
        match self {
            MatchPolicy::Key => a.kind() == b.kind() && a.id_string() == b.id_string(),
            MatchPolicy::Structural => a == b,
        }
    }
}
