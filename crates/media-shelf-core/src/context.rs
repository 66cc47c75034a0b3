use media_shelf_config::Config;
use media_shelf_gateway::{CollectionGateway, FAVORITES_COLLECTION, RECENTLY_WATCHED_COLLECTION};
use media_shelf_models::MatchPolicy;
use std::sync::Arc;
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::favorites::FavoritesStore;
use crate::outcome::LoadOutcome;
use crate::recently_viewed::RecentlyViewedStore;
use crate::session::SessionProvider;

/// Knobs shared by both stores.
#[derive(Clone)]
pub struct StoreSettings {
    pub policy: MatchPolicy,
    pub favorites_collection: String,
    pub recently_watched_collection: String,
    pub clock: Arc<dyn Clock>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            favorites_collection: FAVORITES_COLLECTION.to_string(),
            recently_watched_collection: RECENTLY_WATCHED_COLLECTION.to_string(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl StoreSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            policy: config.identity.match_policy,
            favorites_collection: config.collections.favorites.clone(),
            recently_watched_collection: config.collections.recently_watched.clone(),
            ..Self::default()
        }
    }
}

/// What [`ShelfContext::hydrate`] found.
#[derive(Debug)]
pub struct HydrateReport {
    pub favorites: LoadOutcome,
    pub recently_viewed: Result<usize, StoreError>,
}

/// The one instance of each store, built at startup and handed to whatever
/// needs them.
#[derive(Clone)]
pub struct ShelfContext {
    session: Arc<dyn SessionProvider>,
    favorites: Arc<FavoritesStore>,
    recently_viewed: Arc<RecentlyViewedStore>,
}

impl ShelfContext {
    pub fn new(
        gateway: Arc<dyn CollectionGateway>,
        session: Arc<dyn SessionProvider>,
        settings: StoreSettings,
    ) -> Self {
        let favorites = FavoritesStore::new(gateway.clone(), session.clone())
            .with_clock(settings.clock.clone())
            .with_policy(settings.policy)
            .with_collection(settings.favorites_collection);
        let recently_viewed = RecentlyViewedStore::new(gateway, session.clone())
            .with_clock(settings.clock)
            .with_policy(settings.policy)
            .with_collection(settings.recently_watched_collection);

        Self {
            session,
            favorites: Arc::new(favorites),
            recently_viewed: Arc::new(recently_viewed),
        }
    }

    pub fn favorites(&self) -> &Arc<FavoritesStore> {
        &self.favorites
    }

    pub fn recently_viewed(&self) -> &Arc<RecentlyViewedStore> {
        &self.recently_viewed
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.session.current_user_id()
    }

    /// Load both stores, as done when a session starts.
    pub async fn hydrate(&self) -> HydrateReport {
        let (favorites, recently_viewed) = tokio::join!(self.favorites.load(), self.recently_viewed.load());
        info!(
            "Hydrated stores: favorites={:?}, recently_viewed={:?}",
            favorites,
            recently_viewed.as_ref().map_err(|e| e.to_string())
        );
        HydrateReport {
            favorites,
            recently_viewed,
        }
    }

    /// Drop local state of both stores, for use after sign-out.
    pub fn reset_local(&self) {
        self.favorites.clear();
        self.recently_viewed.clear_local();
    }
}
