use super::*;
use crate::clock::ManualClock;
use crate::session::SharedSession;
use media_shelf_gateway::{MemoryGateway, StoredDocument};
use media_shelf_models::{Book, Movie, Track};

const USER: &str = "uid-1";
const COLLECTION: &str = "recently_watched";

struct Fixture {
    gateway: Arc<MemoryGateway>,
    session: Arc<SharedSession>,
    clock: Arc<ManualClock>,
    store: RecentlyViewedStore,
}

fn fixture_with_policy(policy: MatchPolicy) -> Fixture {
    let gateway = Arc::new(MemoryGateway::new());
    let session = Arc::new(SharedSession::signed_in(USER));
    let clock = Arc::new(ManualClock::new(10_000));
    let store = RecentlyViewedStore::new(gateway.clone(), session.clone())
        .with_clock(clock.clone())
        .with_policy(policy);
    Fixture {
        gateway,
        session,
        clock,
        store,
    }
}

fn fixture() -> Fixture {
    fixture_with_policy(MatchPolicy::Key)
}

fn book(id: &str, title: &str) -> MediaItem {
    MediaItem::Book(Book {
        id: id.to_string(),
        title: title.to_string(),
        author: "Author".to_string(),
        image_url: "http://img/book".to_string(),
        published_date: "2004".to_string(),
    })
}

fn track(id: &str) -> MediaItem {
    MediaItem::Track(Track {
        id: id.to_string(),
        track_name: "Track".to_string(),
        artist_name: "Artist".to_string(),
        image_url: "http://img/track".to_string(),
        release_date: "2015".to_string(),
    })
}

fn movie(id: i64) -> MediaItem {
    MediaItem::Movie(Movie {
        id,
        title: format!("Movie {}", id),
        release_date: "1994".to_string(),
        vote_average: Some(8.0),
        poster_path: Some("/poster.jpg".to_string()),
    })
}

#[tokio::test]
async fn test_revisit_moves_item_to_front() {
    let f = fixture();
    f.store.record_visit(book("b1", "Dune")).await.unwrap();
    f.clock.advance(5);
    f.store.record_visit(track("t1")).await.unwrap();
    f.clock.advance(5);
    let outcome = f.store.record_visit(book("b1", "Dune")).await.unwrap();

    assert_eq!(outcome, VisitOutcome::Recorded { added_at_millis: 10_010, moved: true });
    let entries = f.store.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].item, book("b1", "Dune"));
    assert_eq!(entries[1].item, track("t1"));
    assert_eq!(f.gateway.documents(USER, COLLECTION).await.len(), 2);
}

#[tokio::test]
async fn test_revisit_does_not_grow_list_and_refreshes_timestamp() {
    let f = fixture();
    f.store.record_visit(movie(1)).await.unwrap();
    f.clock.advance(1);
    f.store.record_visit(movie(2)).await.unwrap();
    let previous = f
        .store
        .entries()
        .into_iter()
        .find(|e| e.item == movie(1))
        .map(|e| e.added_at_millis)
        .unwrap();

    f.clock.advance(1);
    f.store.record_visit(movie(1)).await.unwrap();

    let entries = f.store.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].item, movie(1));
    assert!(entries[0].added_at_millis >= previous);
    let doc = f.gateway.document(USER, COLLECTION, "movie_1").await.unwrap();
    assert_eq!(doc.timestamp, entries[0].added_at_millis);
}

#[tokio::test]
async fn test_revisit_lands_first_even_if_clock_stalls_or_rewinds() {
    let f = fixture();
    f.store.record_visit(movie(1)).await.unwrap();
    f.store.record_visit(movie(2)).await.unwrap();
    f.clock.set(1);
    f.store.record_visit(movie(1)).await.unwrap();

    let entries = f.store.entries();
    assert_eq!(entries[0].item, movie(1));
    assert_eq!(entries[0].added_at_millis, 10_000);
    for pair in entries.windows(2) {
        assert!(pair[0].added_at_millis >= pair[1].added_at_millis);
    }
}

#[tokio::test]
async fn test_visit_without_session_is_noop() {
    let f = fixture();
    f.session.sign_out();

    assert_eq!(f.store.record_visit(movie(1)).await.unwrap(), VisitOutcome::NoSession);
    assert_eq!(f.store.clear_all().await, ClearOutcome::NoSession);
    assert!(f.store.is_empty());
    assert_eq!(f.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_load_without_session_reports_failure() {
    let f = fixture();
    f.session.sign_out();

    let err = f.store.load().await.unwrap_err();
    assert!(matches!(err, StoreError::NoSession));
    assert_eq!(f.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_load_replaces_list_newest_first() {
    let f = fixture();
    f.store.record_visit(movie(99)).await.unwrap();
    f.gateway.delete_all(USER, COLLECTION).await.unwrap();

    for (item, ts) in [(movie(1), 100), (book("b1", "Dune"), 300), (track("t1"), 200)] {
        let doc = RemoteDocument::from_item(&item, ts).unwrap();
        f.gateway.seed(USER, COLLECTION, &item.doc_id(), doc).await;
    }

    assert_eq!(f.store.load().await.unwrap(), 3);
    let stamps: Vec<i64> = f.store.entries().iter().map(|e| e.added_at_millis).collect();
    assert_eq!(stamps, vec![300, 200, 100]);
    assert!(!f.store.entries().iter().any(|e| e.item == movie(99)));
}

#[tokio::test]
async fn test_load_decode_error_keeps_previous_list() {
    let f = fixture();
    f.store.record_visit(movie(1)).await.unwrap();
    f.gateway
        .seed(
            USER,
            COLLECTION,
            "music_bad",
            RemoteDocument {
                doc_type: "music".to_string(),
                data: "{\"id\": 5}".to_string(),
                timestamp: 1,
            },
        )
        .await;

    let err = f.store.load().await.unwrap_err();
    assert!(matches!(err, StoreError::Decode { ref doc_id, .. } if doc_id == "music_bad"));
    assert_eq!(f.store.len(), 1);
}

#[tokio::test]
async fn test_load_gateway_error_keeps_previous_list() {
    let f = fixture();
    f.store.record_visit(movie(1)).await.unwrap();
    f.gateway.fail_next(1);

    assert!(matches!(f.store.load().await, Err(StoreError::Gateway(_))));
    assert_eq!(f.store.len(), 1);
}

#[tokio::test]
async fn test_record_visit_gateway_error_leaves_list() {
    let f = fixture();
    f.gateway.fail_next(1);

    assert!(f.store.record_visit(movie(1)).await.is_err());
    assert!(f.store.is_empty());
}

#[tokio::test]
async fn test_clear_all_removes_remote_and_local() {
    let f = fixture();
    f.store.record_visit(movie(1)).await.unwrap();
    f.store.record_visit(book("b1", "Dune")).await.unwrap();
    f.store.record_visit(track("t1")).await.unwrap();

    assert_eq!(f.store.clear_all().await, ClearOutcome::Cleared { removed: 3 });
    assert!(f.store.is_empty());
    assert!(f.gateway.documents(USER, COLLECTION).await.is_empty());
}

#[tokio::test]
async fn test_clear_all_failure_keeps_local_list() {
    let f = fixture();
    f.store.record_visit(movie(1)).await.unwrap();
    f.gateway.set_offline(true);

    assert!(matches!(f.store.clear_all().await, ClearOutcome::Failed(_)));
    assert_eq!(f.store.len(), 1);
}

/// Commits at most `commit_limit` deletes, then fails the rest of the batch.
struct ChunkFailingGateway {
    inner: MemoryGateway,
    commit_limit: usize,
}

#[async_trait::async_trait]
impl CollectionGateway for ChunkFailingGateway {
    fn backend_name(&self) -> &str {
        "chunk-failing"
    }

    async fn get_all(&self, user_id: &str, collection: &str) -> Result<Vec<StoredDocument>, GatewayError> {
        self.inner.get_all(user_id, collection).await
    }

    async fn upsert(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
        document: &RemoteDocument,
    ) -> Result<(), GatewayError> {
        self.inner.upsert(user_id, collection, doc_id, document).await
    }

    async fn delete(&self, user_id: &str, collection: &str, doc_id: &str) -> Result<(), GatewayError> {
        self.inner.delete(user_id, collection, doc_id).await
    }

    async fn delete_all(&self, user_id: &str, collection: &str) -> Result<usize, GatewayError> {
        let documents = self.inner.get_all(user_id, collection).await?;
        let mut removed = 0;
        for stored in documents.iter().take(self.commit_limit) {
            self.inner.delete(user_id, collection, &stored.id).await?;
            removed += 1;
        }
        Err(GatewayError::PartialDelete {
            removed,
            source: Box::new(GatewayError::Unavailable("commit rejected".to_string())),
        })
    }
}

#[tokio::test]
async fn test_partial_clear_rereads_remaining_items() {
    let gateway = Arc::new(ChunkFailingGateway {
        inner: MemoryGateway::new(),
        commit_limit: 2,
    });
    let clock = Arc::new(ManualClock::new(10_000));
    let store = RecentlyViewedStore::new(gateway.clone(), Arc::new(SharedSession::signed_in(USER)))
        .with_clock(clock.clone());
    for id in 1..=3 {
        store.record_visit(movie(id)).await.unwrap();
        clock.advance(10);
    }

    let outcome = store.clear_all().await;
    assert!(matches!(outcome, ClearOutcome::Failed(ref reason) if reason.contains("only 2")), "{:?}", outcome);

    // The two newest were deleted remotely; only the oldest is still listed
    let entries = store.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].item, movie(1));
    assert_eq!(gateway.inner.documents(USER, COLLECTION).await.len(), 1);
}

#[tokio::test]
async fn test_rewound_clock_timestamp_is_stored_remotely_and_survives_reload() {
    let f = fixture();
    f.store.record_visit(movie(1)).await.unwrap();
    f.clock.advance(500);
    f.store.record_visit(movie(2)).await.unwrap();
    f.clock.set(2_000);
    f.store.record_visit(movie(1)).await.unwrap();

    // The bumped ordering key is what the remote document carries
    let doc = f.gateway.document(USER, COLLECTION, "movie_1").await.unwrap();
    assert_eq!(doc.timestamp, 10_500);

    let reloaded = RecentlyViewedStore::new(f.gateway.clone(), f.session.clone());
    reloaded.load().await.unwrap();
    let order: Vec<MediaItem> = reloaded.entries().into_iter().map(|e| e.item).collect();
    assert_eq!(order, vec![movie(1), movie(2)]);
}

#[tokio::test]
async fn test_structural_policy_keeps_retitled_items_apart() {
    let f = fixture_with_policy(MatchPolicy::Structural);
    f.store.record_visit(book("b1", "Dune")).await.unwrap();
    f.store.record_visit(book("b1", "Dune (Deluxe)")).await.unwrap();

    assert_eq!(f.store.len(), 2);
    assert_eq!(f.gateway.documents(USER, COLLECTION).await.len(), 1);
}

#[tokio::test]
async fn test_key_policy_collapses_retitled_items() {
    let f = fixture();
    f.store.record_visit(book("b1", "Dune")).await.unwrap();
    let outcome = f.store.record_visit(book("b1", "Dune (Deluxe)")).await.unwrap();

    assert!(matches!(outcome, VisitOutcome::Recorded { moved: true, .. }));
    assert_eq!(f.store.len(), 1);
    assert_eq!(f.store.entries()[0].item.title(), "Dune (Deluxe)");
}

#[tokio::test]
async fn test_latest_and_clear_local() {
    let f = fixture();
    for id in 1..=5 {
        f.clock.advance(1);
        f.store.record_visit(movie(id)).await.unwrap();
    }
    let latest: Vec<MediaItem> = f.store.latest(2).into_iter().map(|e| e.item).collect();
    assert_eq!(latest, vec![movie(5), movie(4)]);

    f.store.clear_local();
    assert!(f.store.is_empty());
    assert_eq!(f.gateway.documents(USER, COLLECTION).await.len(), 5);
}
