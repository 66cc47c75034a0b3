use super::*;
use crate::clock::ManualClock;
use crate::session::SharedSession;
use media_shelf_gateway::MemoryGateway;

const USER: &str = "uid-1";

struct Fixture {
    gateway: Arc<MemoryGateway>,
    session: Arc<SharedSession>,
    clock: Arc<ManualClock>,
    store: FavoritesStore,
}

fn fixture_with_policy(policy: MatchPolicy) -> Fixture {
    let gateway = Arc::new(MemoryGateway::new());
    let session = Arc::new(SharedSession::signed_in(USER));
    let clock = Arc::new(ManualClock::new(1_000));
    let store = FavoritesStore::new(gateway.clone(), session.clone())
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

fn movie(id: i64, title: &str) -> MediaItem {
    MediaItem::Movie(Movie {
        id,
        title: title.to_string(),
        release_date: "2020".to_string(),
        vote_average: None,
        poster_path: None,
    })
}

fn book(id: &str) -> MediaItem {
    MediaItem::Book(Book {
        id: id.to_string(),
        title: format!("Book {}", id),
        author: "Author".to_string(),
        image_url: "http://img/book".to_string(),
        published_date: "1999".to_string(),
    })
}

fn track(id: &str) -> MediaItem {
    MediaItem::Track(Track {
        id: id.to_string(),
        track_name: format!("Track {}", id),
        artist_name: "Artist".to_string(),
        image_url: "http://img/track".to_string(),
        release_date: "2011".to_string(),
    })
}

fn assert_newest_first(entries: &[TimestampedEntry]) {
    for pair in entries.windows(2) {
        assert!(
            pair[0].added_at_millis >= pair[1].added_at_millis,
            "entries out of order: {} before {}",
            pair[0].added_at_millis,
            pair[1].added_at_millis
        );
    }
}

#[tokio::test]
async fn test_toggle_on_creates_document_and_entries() {
    let f = fixture();
    let outcome = f.store.toggle_favorite(movie(42, "X")).await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Added { added_at_millis: 1_000 });
    assert_eq!(f.store.movies().len(), 1);
    assert_eq!(f.store.unified().len(), 1);
    assert!(f.store.is_favorited(&movie(42, "X")));

    let doc = f.gateway.document(USER, "favorites", "movie_42").await.unwrap();
    assert_eq!(doc.doc_type, "movie");
    assert_eq!(doc.timestamp, 1_000);
}

#[tokio::test]
async fn test_toggle_twice_restores_original_state() {
    let f = fixture();
    f.store.toggle_favorite(movie(42, "X")).await.unwrap();
    let outcome = f.store.toggle_favorite(movie(42, "X")).await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Removed);
    assert!(f.store.movies().is_empty());
    assert!(f.store.unified().is_empty());
    assert!(!f.store.is_favorited(&movie(42, "X")));
    assert!(f.gateway.document(USER, "favorites", "movie_42").await.is_none());
}

#[tokio::test]
async fn test_toggle_without_session_is_noop() {
    let f = fixture();
    f.store.toggle_favorite(book("b1")).await.unwrap();
    f.session.sign_out();
    let calls_before = f.gateway.call_count();

    let outcome = f.store.toggle_favorite(book("b1")).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::NoSession);
    let outcome = f.store.toggle_favorite(movie(1, "Other")).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::NoSession);

    assert_eq!(f.gateway.call_count(), calls_before);
    assert_eq!(f.store.books().len(), 1);
    assert_eq!(f.store.len(), 1);
}

#[tokio::test]
async fn test_load_without_session_is_silent_noop() {
    let f = fixture();
    f.session.sign_out();
    assert_eq!(f.store.load().await, LoadOutcome::NoSession);
    assert_eq!(f.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_unified_list_sorted_newest_first() {
    let f = fixture();
    f.store.toggle_favorite(movie(1, "A")).await.unwrap();
    f.clock.advance(10);
    f.store.toggle_favorite(book("b1")).await.unwrap();
    f.clock.advance(10);
    f.store.toggle_favorite(track("t1")).await.unwrap();
    // Clock stepping backwards must not break the ordering
    f.clock.set(500);
    f.store.toggle_favorite(movie(2, "B")).await.unwrap();

    let unified = f.store.unified();
    assert_newest_first(&unified);
    let ids: Vec<String> = unified.iter().map(|e| e.item.doc_id()).collect();
    assert_eq!(ids, vec!["music_t1", "book_b1", "movie_1", "movie_2"]);
}

#[tokio::test]
async fn test_per_kind_lists_keep_append_order() {
    let f = fixture();
    f.clock.set(2_000);
    f.store.toggle_favorite(movie(1, "Later stamp")).await.unwrap();
    f.clock.set(1_000);
    f.store.toggle_favorite(movie(2, "Earlier stamp")).await.unwrap();

    let ids: Vec<i64> = f.store.movies().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2]);
    let unified: Vec<String> = f.store.unified().iter().map(|e| e.item.doc_id()).collect();
    assert_eq!(unified, vec!["movie_1", "movie_2"]);
}

#[tokio::test]
async fn test_load_hydrates_every_kind_and_skips_bad_documents() {
    let f = fixture();
    let seed = [(movie(1, "A"), 10), (book("b1"), 30), (track("t1"), 20)];
    for (item, ts) in &seed {
        let doc = RemoteDocument::from_item(item, *ts).unwrap();
        f.gateway.seed(USER, "favorites", &item.doc_id(), doc).await;
    }
    f.gateway
        .seed(
            USER,
            "favorites",
            "podcast_9",
            RemoteDocument {
                doc_type: "podcast".to_string(),
                data: "{}".to_string(),
                timestamp: 40,
            },
        )
        .await;
    f.gateway
        .seed(
            USER,
            "favorites",
            "book_broken",
            RemoteDocument {
                doc_type: "book".to_string(),
                data: "not json".to_string(),
                timestamp: 50,
            },
        )
        .await;

    let outcome = f.store.load().await;
    assert_eq!(outcome, LoadOutcome::Loaded { loaded: 3, skipped: 2 });
    assert_eq!(f.store.movies().len(), 1);
    assert_eq!(f.store.books().len(), 1);
    assert_eq!(f.store.tracks().len(), 1);

    let unified = f.store.unified();
    assert_newest_first(&unified);
    assert_eq!(unified[0].item, book("b1"));
    assert!(f.store.is_favorited(&track("t1")));
}

#[tokio::test]
async fn test_load_failure_keeps_previous_state() {
    let f = fixture();
    f.store.toggle_favorite(movie(1, "A")).await.unwrap();
    f.store.toggle_favorite(book("b1")).await.unwrap();

    f.gateway.fail_next(1);
    let outcome = f.store.load().await;
    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    assert_eq!(f.store.len(), 2);
    assert!(f.store.is_favorited(&movie(1, "A")));
}

#[tokio::test]
async fn test_load_replaces_local_state() {
    let f = fixture();
    f.store.toggle_favorite(movie(1, "A")).await.unwrap();
    f.gateway.delete_all(USER, "favorites").await.unwrap();

    assert!(f.store.load().await.is_loaded());
    assert!(f.store.is_empty());
}

#[tokio::test]
async fn test_toggle_gateway_error_propagates_and_leaves_state() {
    let f = fixture();
    f.gateway.fail_next(1);
    let err = f.store.toggle_favorite(movie(1, "A")).await.unwrap_err();
    assert!(matches!(err, StoreError::Gateway(_)));
    assert!(f.store.is_empty());

    f.store.toggle_favorite(movie(1, "A")).await.unwrap();
    f.gateway.fail_next(1);
    assert!(f.store.toggle_favorite(movie(1, "A")).await.is_err());
    assert!(f.store.is_favorited(&movie(1, "A")));
    assert!(f.gateway.document(USER, "favorites", "movie_1").await.is_some());
}

#[tokio::test]
async fn test_clear_empties_every_kind_and_unified() {
    let f = fixture();
    f.store.toggle_favorite(movie(1, "A")).await.unwrap();
    f.store.toggle_favorite(book("b1")).await.unwrap();
    f.store.toggle_favorite(track("t1")).await.unwrap();

    f.store.clear();

    for kind in MediaKind::ALL {
        assert!(f.store.entries(kind).is_empty(), "{} list not cleared", kind);
    }
    assert!(f.store.unified().is_empty());
    // Local only
    assert_eq!(f.gateway.documents(USER, "favorites").await.len(), 3);
}

#[tokio::test]
async fn test_concurrent_double_toggle_is_serialized() {
    let f = fixture();
    // Each gateway call suspends, so both toggles are in flight at once
    f.gateway.set_yield_on_call(true);
    let item = movie(7, "Double tap");

    let (first, second) = futures::future::join(
        f.store.toggle_favorite(item.clone()),
        f.store.toggle_favorite(item.clone()),
    )
    .await;
    let mut outcomes = vec![first.unwrap(), second.unwrap()];
    outcomes.sort_by_key(|o| matches!(o, ToggleOutcome::Removed));

    assert!(matches!(outcomes[0], ToggleOutcome::Added { .. }), "{:?}", outcomes);
    assert_eq!(outcomes[1], ToggleOutcome::Removed, "{:?}", outcomes);
    assert!(f.store.movies().len() <= 1);
    assert!(f.store.movies().is_empty());
    assert!(f.store.unified().is_empty());
    assert!(f.gateway.document(USER, "favorites", "movie_7").await.is_none());
    assert_eq!(f.gateway.call_count(), 2);
}

#[tokio::test]
async fn test_concurrent_triple_toggle_ends_favorited() {
    let f = fixture();
    f.gateway.set_yield_on_call(true);
    let item = movie(8, "Triple tap");

    let results = futures::future::join_all((0..3).map(|_| f.store.toggle_favorite(item.clone()))).await;
    let added = results
        .iter()
        .filter(|r| matches!(r, Ok(ToggleOutcome::Added { .. })))
        .count();
    let removed = results.iter().filter(|r| matches!(r, Ok(ToggleOutcome::Removed))).count();

    assert_eq!((added, removed), (2, 1));
    assert_eq!(f.store.movies().len(), 1);
    assert!(f.store.is_favorited(&item));
    assert!(f.gateway.document(USER, "favorites", "movie_8").await.is_some());
}

#[tokio::test]
async fn test_concurrent_toggles_of_distinct_items() {
    let f = fixture();
    f.gateway.set_yield_on_call(true);
    let items = vec![movie(1, "A"), book("b1"), track("t1"), movie(2, "B")];

    let results = futures::future::join_all(items.iter().cloned().map(|item| f.store.toggle_favorite(item))).await;
    assert!(results.iter().all(|r| matches!(r, Ok(ToggleOutcome::Added { .. }))));
    assert_eq!(f.store.len(), 4);
    assert_eq!(f.store.movies().len(), 2);
    assert_eq!(f.gateway.documents(USER, "favorites").await.len(), 4);
    assert_eq!(f.store.in_flight.active_keys(), 0);
}

#[tokio::test]
async fn test_key_policy_matches_retitled_item() {
    let f = fixture();
    f.store.toggle_favorite(movie(42, "Old title")).await.unwrap();

    assert!(f.store.is_favorited(&movie(42, "New title")));
    let outcome = f.store.toggle_favorite(movie(42, "New title")).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Removed);
    assert!(f.store.is_empty());
}

#[tokio::test]
async fn test_structural_policy_keeps_legacy_behavior() {
    let f = fixture_with_policy(MatchPolicy::Structural);
    f.store.toggle_favorite(movie(42, "Old title")).await.unwrap();

    assert!(!f.store.is_favorited(&movie(42, "New title")));
    let outcome = f.store.toggle_favorite(movie(42, "New title")).await.unwrap();
    assert!(matches!(outcome, ToggleOutcome::Added { .. }));

    // Two local entries share one remote document
    assert_eq!(f.store.movies().len(), 2);
    assert_eq!(f.gateway.documents(USER, "favorites").await.len(), 1);
}

#[tokio::test]
async fn test_unified_filtered_views() {
    let f = fixture();
    f.store.toggle_favorite(movie(1, "A")).await.unwrap();
    f.clock.advance(1);
    f.store.toggle_favorite(book("b1")).await.unwrap();
    f.clock.advance(1);
    f.store.toggle_favorite(book("b2")).await.unwrap();

    assert_eq!(f.store.unified_filtered(None).len(), 3);
    let books = f.store.unified_filtered(Some(MediaKind::Book));
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].item, book("b2"));
    assert!(f.store.unified_filtered(Some(MediaKind::Music)).is_empty());
}

#[tokio::test]
async fn test_custom_collection_name() {
    let gateway = Arc::new(MemoryGateway::new());
    let store = FavoritesStore::new(gateway.clone(), Arc::new(SharedSession::signed_in(USER)))
        .with_collection("starred");
    store.toggle_favorite(book("b1")).await.unwrap();

    assert_eq!(gateway.documents(USER, "starred").await.len(), 1);
    assert!(gateway.documents(USER, "favorites").await.is_empty());
}
