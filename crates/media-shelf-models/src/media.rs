use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::document::DecodeError;
use crate::identity::{doc_id, ItemKey};

/// Category of a media item.
///
/// The lowercase tag is what gets written into the `type` field of remote
/// documents and used as the prefix of document ids. Tracks are stored under
/// `music` for compatibility with existing user collections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Book,
    Music,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [MediaKind::Movie, MediaKind::Book, MediaKind::Music];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Book => "book",
            MediaKind::Music => "music",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaKind::Movie),
            "book" => Ok(MediaKind::Book),
            "music" => Ok(MediaKind::Music),
            other => Err(DecodeError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub published_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub track_name: String,
    #[serde(default)]
    pub artist_name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub release_date: String,
}

/// A movie, book or track as shown on a detail screen.
///
/// `PartialEq` compares every field. Use [`MediaItem::key`] when only the
/// backing `(kind, id)` matters.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaItem {
    Movie(Movie),
    Book(Book),
    Track(Track),
}

impl MediaItem {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaItem::Movie(_) => MediaKind::Movie,
            MediaItem::Book(_) => MediaKind::Book,
            MediaItem::Track(_) => MediaKind::Music,
        }
    }

    /// Backing id rendered as a string (movie ids are numeric upstream).
    pub fn id_string(&self) -> String {
        match self {
            MediaItem::Movie(m) => m.id.to_string(),
            MediaItem::Book(b) => b.id.clone(),
            MediaItem::Track(t) => t.id.clone(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MediaItem::Movie(m) => &m.title,
            MediaItem::Book(b) => &b.title,
            MediaItem::Track(t) => &t.track_name,
        }
    }

    /// Secondary line for listings: release date, author or artist.
    pub fn subtitle(&self) -> &str {
        match self {
            MediaItem::Movie(m) => &m.release_date,
            MediaItem::Book(b) => &b.author,
            MediaItem::Track(t) => &t.artist_name,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.kind(), self.id_string())
    }

    pub fn doc_id(&self) -> String {
        doc_id(self.kind(), &self.id_string())
    }

    /// Serialize the variant payload. The kind is not part of the output;
    /// it travels next to it in the document's `type` field.
    pub fn encode_data(&self) -> serde_json::Result<String> {
        match self {
            MediaItem::Movie(m) => serde_json::to_string(m),
            MediaItem::Book(b) => serde_json::to_string(b),
            MediaItem::Track(t) => serde_json::to_string(t),
        }
    }

    pub fn decode(kind: MediaKind, data: &str) -> Result<Self, DecodeError> {
        let item = match kind {
            MediaKind::Movie => MediaItem::Movie(serde_json::from_str(data)?),
            MediaKind::Book => MediaItem::Book(serde_json::from_str(data)?),
            MediaKind::Music => MediaItem::Track(serde_json::from_str(data)?),
        };
        Ok(item)
    }
}

impl From<Movie> for MediaItem {
    fn from(movie: Movie) -> Self {
        MediaItem::Movie(movie)
    }
}

impl From<Book> for MediaItem {
    fn from(book: Book) -> Self {
        MediaItem::Book(book)
    }
}

impl From<Track> for MediaItem {
    fn from(track: Track) -> Self {
        MediaItem::Track(track)
    }
}
