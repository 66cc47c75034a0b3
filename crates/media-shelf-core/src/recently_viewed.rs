use media_shelf_gateway::{CollectionGateway, GatewayError, RECENTLY_WATCHED_COLLECTION};
use media_shelf_models::{sort_newest_first, MatchPolicy, MediaItem, RemoteDocument, TimestampedEntry};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::outcome::{ClearOutcome, VisitOutcome};
use crate::session::SessionProvider;

#[cfg(test)]
mod tests;

/// Items the signed-in user opened, newest first. Re-opening an item moves it
/// back to the front instead of adding a second entry.
pub struct RecentlyViewedStore {
    gateway: Arc<dyn CollectionGateway>,
    session: Arc<dyn SessionProvider>,
    clock: Arc<dyn Clock>,
    policy: MatchPolicy,
    collection: String,
    entries: RwLock<Vec<TimestampedEntry>>,
}

impl RecentlyViewedStore {
    pub fn new(gateway: Arc<dyn CollectionGateway>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            gateway,
            session,
            clock: Arc::new(SystemClock),
            policy: MatchPolicy::default(),
            collection: RECENTLY_WATCHED_COLLECTION.to_string(),
            entries: RwLock::new(Vec::new()),
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

    fn read(&self) -> RwLockReadGuard<'_, Vec<TimestampedEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<TimestampedEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the local list with the remote collection.
    ///
    /// Unlike the favorites load, a missing session is reported as
    /// [`StoreError::NoSession`]. One undecodable document fails the whole
    /// load; local state is only replaced on success.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let user_id = self.session.current_user_id().ok_or_else(|| {
            debug!("Cannot load recently viewed: no active session");
            StoreError::NoSession
        })?;

        let documents = self
            .gateway
            .get_all(&user_id, &self.collection)
            .await
            .map_err(|e| {
                warn!("Failed to load recently viewed for {}: {}", user_id, e);
                StoreError::from(e)
            })?;

        let mut entries = Vec::with_capacity(documents.len());
        for stored in documents {
            let entry = stored.document.decode().map_err(|source| {
                warn!("Recently viewed document {} is unreadable: {}", stored.id, source);
                StoreError::Decode {
                    doc_id: stored.id.clone(),
                    source,
                }
            })?;
            entries.push(entry);
        }
        sort_newest_first(&mut entries);

        let count = entries.len();
        *self.write() = entries;
        info!("Loaded {} recently viewed items for {}", count, user_id);
        Ok(count)
    }

    /// Record that the item was opened.
    ///
    /// The remote document is upserted first; gateway errors are returned and
    /// leave the local list untouched. The new timestamp is never older than
    /// the current head of the list, so the item always lands at index 0.
    ///
    /// That timestamp is also the one stored remotely. When the local clock
    /// is behind the newest entry, the document therefore carries the head's
    /// timestamp instead of the wall-clock time, which keeps the order the
    /// same after a reload.
    pub async fn record_visit(&self, item: MediaItem) -> Result<VisitOutcome, StoreError> {
        let Some(user_id) = self.session.current_user_id() else {
            debug!("Not recording visit to {}: no active session", item.key());
            return Ok(VisitOutcome::NoSession);
        };

        let now = self.clock.now_millis();
        let added_at_millis = match self.read().first() {
            Some(head) => now.max(head.added_at_millis),
            None => now,
        };

        let doc_id = item.doc_id();
        let document = RemoteDocument::from_item(&item, added_at_millis)?;
        self.gateway
            .upsert(&user_id, &self.collection, &doc_id, &document)
            .await?;

        let policy = self.policy;
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|entry| !policy.matches(&entry.item, &item));
        let moved = entries.len() < before;
        entries.insert(0, TimestampedEntry::new(item, added_at_millis));
        sort_newest_first(&mut entries);
        debug!("Recorded visit to {} (moved: {})", doc_id, moved);
        Ok(VisitOutcome::Recorded { added_at_millis, moved })
    }

    /// Delete every remote document in one batch, then empty the local list.
    /// Errors are logged and leave the local list as it was, except when some
    /// batches went through: the list is then re-read so it only shows what
    /// is still stored.
    pub async fn clear_all(&self) -> ClearOutcome {
        let Some(user_id) = self.session.current_user_id() else {
            debug!("Not clearing recently viewed: no active session");
            return ClearOutcome::NoSession;
        };

        match self.gateway.delete_all(&user_id, &self.collection).await {
            Ok(removed) => {
                self.write().clear();
                info!("Cleared {} recently viewed items for {}", removed, user_id);
                ClearOutcome::Cleared { removed }
            }
            Err(GatewayError::PartialDelete { removed, source }) => {
                warn!(
                    "Cleared only {} recently viewed items for {}: {}",
                    removed, user_id, source
                );
                if let Err(e) = self.load().await {
                    warn!("Could not re-read recently viewed after partial clear: {}", e);
                }
                ClearOutcome::Failed(format!("only {} items were removed: {}", removed, source))
            }
            Err(e) => {
                warn!("Failed to clear recently viewed for {}: {}", user_id, e);
                ClearOutcome::Failed(e.to_string())
            }
        }
    }

    /// Forget local entries without touching the remote collection, e.g. on sign-out.
    pub fn clear_local(&self) {
        self.write().clear();
    }

    pub fn entries(&self) -> Vec<TimestampedEntry> {
        self.read().clone()
    }

    pub fn latest(&self, n: usize) -> Vec<TimestampedEntry> {
        self.read().iter().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
