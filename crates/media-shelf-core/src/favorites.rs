use media_shelf_gateway::{CollectionGateway, FAVORITES_COLLECTION};
use media_shelf_models::{
    sort_newest_first, Book, MatchPolicy, MediaItem, MediaKind, Movie, RemoteDocument, TimestampedEntry, Track,
};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::inflight::InFlight;
use crate::outcome::{LoadOutcome, ToggleOutcome};
use crate::session::SessionProvider;

#[cfg(test)]
mod tests;

#[derive(Debug, Default, Clone)]
struct FavoritesState {
    // Per-kind lists keep insertion order; only `unified` is kept sorted.
    movies: Vec<TimestampedEntry>,
    books: Vec<TimestampedEntry>,
    tracks: Vec<TimestampedEntry>,
    unified: Vec<TimestampedEntry>,
}

impl FavoritesState {
    fn kind_list(&self, kind: MediaKind) -> &Vec<TimestampedEntry> {
        match kind {
            MediaKind::Movie => &self.movies,
            MediaKind::Book => &self.books,
            MediaKind::Music => &self.tracks,
        }
    }

    fn kind_list_mut(&mut self, kind: MediaKind) -> &mut Vec<TimestampedEntry> {
        match kind {
            MediaKind::Movie => &mut self.movies,
            MediaKind::Book => &mut self.books,
            MediaKind::Music => &mut self.tracks,
        }
    }
}

/// Favorited movies, books and tracks of the signed-in user.
///
/// Every toggle writes to the remote collection first and only then updates
/// the local lists, so a failed write leaves local state as it was. Toggles
/// for the same document id are serialized.
pub struct FavoritesStore {
    gateway: Arc<dyn CollectionGateway>,
    session: Arc<dyn SessionProvider>,
    clock: Arc<dyn Clock>,
    policy: MatchPolicy,
    collection: String,
    state: RwLock<FavoritesState>,
    in_flight: InFlight,
}

impl FavoritesStore {
    pub fn new(gateway: Arc<dyn CollectionGateway>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            gateway,
            session,
            clock: Arc::new(SystemClock),
            policy: MatchPolicy::default(),
            collection: FAVORITES_COLLECTION.to_string(),
            state: RwLock::new(FavoritesState::default()),
            in_flight: InFlight::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    fn read(&self) -> RwLockReadGuard<'_, FavoritesState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FavoritesState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace local state with the user's remote favorites.
    ///
    /// Documents with an unknown `type` or an unreadable payload are skipped.
    /// On gateway failure the previous local state is kept.
    pub async fn load(&self) -> LoadOutcome {
        let Some(user_id) = self.session.current_user_id() else {
            debug!("Skipping favorites load: no active session");
            return LoadOutcome::NoSession;
        };

        let documents = match self.gateway.get_all(&user_id, &self.collection).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("Failed to load favorites for {}: {}", user_id, e);
                return LoadOutcome::Failed(e.to_string());
            }
        };

        let mut next = FavoritesState::default();
        let mut skipped = 0;
        for stored in documents {
            match stored.document.decode() {
                Ok(entry) => {
                    next.kind_list_mut(entry.item.kind()).push(entry.clone());
                    next.unified.push(entry);
                }
                Err(e) => {
                    skipped += 1;
                    warn!("Skipping favorite {} for {}: {}", stored.id, user_id, e);
                }
            }
        }
        sort_newest_first(&mut next.unified);

        let loaded = next.unified.len();
        *self.write() = next;
        info!("Loaded {} favorites for {} ({} skipped)", loaded, user_id, skipped);
        LoadOutcome::Loaded { loaded, skipped }
    }

    /// Local lookup only; no remote call.
    pub fn is_favorited(&self, item: &MediaItem) -> bool {
        let state = self.read();
        state
            .kind_list(item.kind())
            .iter()
            .any(|entry| self.policy.matches(&entry.item, item))
    }

    /// Add the item to favorites, or remove it if it is already there.
    ///
    /// Gateway errors are returned and leave local state unchanged.
    pub async fn toggle_favorite(&self, item: MediaItem) -> Result<ToggleOutcome, StoreError> {
        let Some(user_id) = self.session.current_user_id() else {
            debug!("Ignoring favorite toggle for {}: no active session", item.key());
            return Ok(ToggleOutcome::NoSession);
        };

        let doc_id = item.doc_id();
        let _flight = self.in_flight.acquire(&doc_id).await;

        // Checked inside the gate so a queued toggle sees the previous one's result
        if self.is_favorited(&item) {
            self.gateway.delete(&user_id, &self.collection, &doc_id).await?;

            let policy = self.policy;
            let mut state = self.write();
            state
                .kind_list_mut(item.kind())
                .retain(|entry| !policy.matches(&entry.item, &item));
            state.unified.retain(|entry| !policy.matches(&entry.item, &item));
            info!("Removed {} from favorites", doc_id);
            Ok(ToggleOutcome::Removed)
        } else {
            let added_at_millis = self.clock.now_millis();
            let document = RemoteDocument::from_item(&item, added_at_millis)?;
            self.gateway
                .upsert(&user_id, &self.collection, &doc_id, &document)
                .await?;

            let entry = TimestampedEntry::new(item, added_at_millis);
            let mut state = self.write();
            state.kind_list_mut(entry.item.kind()).push(entry.clone());
            state.unified.insert(0, entry);
            sort_newest_first(&mut state.unified);
            info!("Added {} to favorites", doc_id);
            Ok(ToggleOutcome::Added { added_at_millis })
        }
    }

    /// Drop every local favorite. Remote documents are left alone.
    pub fn clear(&self) {
        *self.write() = FavoritesState::default();
        debug!("Cleared local favorites");
    }

    /// All favorites, newest first.
    pub fn unified(&self) -> Vec<TimestampedEntry> {
        self.read().unified.clone()
    }

    /// The unified feed narrowed to one kind; `None` is the "All" view.
    pub fn unified_filtered(&self, kind: Option<MediaKind>) -> Vec<TimestampedEntry> {
        let state = self.read();
        match kind {
            None => state.unified.clone(),
            Some(kind) => state
                .unified
                .iter()
                .filter(|entry| entry.item.kind() == kind)
                .cloned()
                .collect(),
        }
    }

    /// Per-kind list in the order items were favorited.
    pub fn entries(&self, kind: MediaKind) -> Vec<TimestampedEntry> {
        self.read().kind_list(kind).clone()
    }

    pub fn movies(&self) -> Vec<Movie> {
        self.read()
            .movies
            .iter()
            .filter_map(|entry| match &entry.item {
                MediaItem::Movie(movie) => Some(movie.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn books(&self) -> Vec<Book> {
        self.read()
            .books
            .iter()
            .filter_map(|entry| match &entry.item {
                MediaItem::Book(book) => Some(book.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.read()
            .tracks
            .iter()
            .filter_map(|entry| match &entry.item {
                MediaItem::Track(track) => Some(track.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().unified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().unified.is_empty()
    }
}
