use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::TimestampedEntry;
use crate::media::{MediaItem, MediaKind};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown media type '{0}'")]
    UnknownKind(String),
    #[error("malformed item payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Shape of one document in a user's `favorites` or `recently_watched`
/// collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    /// JSON-encoded item payload, see [`MediaItem::encode_data`].
    pub data: String,
    pub timestamp: i64,
}

impl RemoteDocument {
    pub fn from_item(item: &MediaItem, timestamp: i64) -> serde_json::Result<Self> {
        Ok(Self {
            doc_type: item.kind().as_str().to_string(),
            data: item.encode_data()?,
            timestamp,
        })
    }

    pub fn kind(&self) -> Result<MediaKind, DecodeError> {
        self.doc_type.parse()
    }

    pub fn decode(&self) -> Result<TimestampedEntry, DecodeError> {
        let item = MediaItem::decode(self.kind()?, &self.data)?;
        Ok(TimestampedEntry::new(item, self.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::Movie;

    #[test]
    fn test_document_serializes_type_field() {
        let item = MediaItem::Movie(Movie {
            id: 42,
            title: "X".to_string(),
            release_date: "2020".to_string(),
            vote_average: Some(8.1),
            poster_path: Some("/p.jpg".to_string()),
        });
        let doc = RemoteDocument::from_item(&item, 1_700_000_000_000).unwrap();
        assert_eq!(doc.doc_type, "movie");

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["type"], "movie");
        assert_eq!(value["timestamp"], 1_700_000_000_000i64);

        let entry = doc.decode().unwrap();
        assert_eq!(entry.item, item);
        assert_eq!(entry.added_at_millis, 1_700_000_000_000);
    }

    #[test]
    fn test_decode_unknown_type() {
        let doc = RemoteDocument {
            doc_type: "podcast".to_string(),
            data: "{}".to_string(),
            timestamp: 1,
        };
        assert!(matches!(doc.decode(), Err(DecodeError::UnknownKind(k)) if k == "podcast"));
    }

    #[test]
    fn test_decode_malformed_payload() {
        let doc = RemoteDocument {
            doc_type: "book".to_string(),
            data: "{not json".to_string(),
            timestamp: 1,
        };
        assert!(matches!(doc.decode(), Err(DecodeError::Payload(_))));
    }
}
