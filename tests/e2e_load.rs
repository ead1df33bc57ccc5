//! End-to-end tests for the loader: all-or-nothing publication, malformed
//! record filtering, and latest-load-wins supersession.

use std::time::Duration;

use tiergraph::{
    ConnectionKind, ConnectionRecord, Error, MemoryStore, SocialGraph, Tier, UserId,
    UserProfile,
};

fn profile(id: &str) -> UserProfile {
    UserProfile::new(id, id)
}

fn friend(a: &str, b: &str) -> ConnectionRecord {
    ConnectionRecord::new(a, b, ConnectionKind::Friend)
}

// ============================================================================
// 1. A failed load publishes nothing
// ============================================================================

#[tokio::test]
async fn test_failed_first_load_publishes_nothing() {
    let store = MemoryStore::seeded(vec![profile("me")], vec![]);
    store.set_fail_reads(true);
    let graph = SocialGraph::with_store(store, UserId::from("me"));

    let err = graph.load().await.unwrap_err();
    assert!(matches!(err, Error::Load(_)));
    assert!(graph.snapshot().is_none());
    assert!(matches!(graph.last_error(), Some(Error::Load(_))));
}

// ============================================================================
// 2. A failed reload keeps the previous snapshot intact
// ============================================================================

#[tokio::test]
async fn test_failed_reload_keeps_previous_snapshot() {
    let store = MemoryStore::seeded(
        vec![profile("me"), profile("b")],
        vec![friend("me", "b")],
    );
    let graph = SocialGraph::with_store(store, UserId::from("me"));
    graph.load().await.unwrap();
    let published = graph.snapshot().unwrap();

    graph.store().set_fail_reads(true);
    assert!(graph.load().await.is_err());

    let retained = graph.snapshot().unwrap();
    assert_eq!(retained.nodes, published.nodes);
    assert_eq!(retained.links, published.links);

    // Retry is a fresh attempt, not a resume.
    graph.store().set_fail_reads(false);
    graph.load().await.unwrap();
    assert!(graph.last_error().is_none());
}

// ============================================================================
// 3. Malformed connections are filtered, not fatal
// ============================================================================

#[tokio::test]
async fn test_connection_to_unknown_user_is_skipped() {
    let store = MemoryStore::seeded(
        vec![profile("me"), profile("b")],
        vec![friend("me", "b"), friend("me", "ghost")],
    );
    let graph = SocialGraph::with_store(store, UserId::from("me"));
    graph.load().await.unwrap();

    let snapshot = graph.snapshot().unwrap();
    // The well-formed link survives; no placeholder node was invented.
    assert_eq!(snapshot.links.len(), 1);
    assert!(snapshot.node(&UserId::from("ghost")).is_none());
    assert_eq!(snapshot.node(&UserId::from("b")).unwrap().tier, Tier::Direct);
    assert!(graph.last_error().is_none());
}

// ============================================================================
// 4. The most recently initiated load wins
// ============================================================================

#[tokio::test]
async fn test_superseded_load_is_discarded() {
    let store = MemoryStore::seeded(vec![profile("me"), profile("b")], vec![]);
    store.set_read_delay(Duration::from_millis(200));
    let graph = SocialGraph::with_store(store, UserId::from("me"));

    // Slow load starts first and captures the old roster.
    let slow = {
        let graph = graph.clone();
        tokio::spawn(async move { graph.load().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Roster changes, then a second load runs fast and publishes.
    graph.store().insert_user(profile("c"));
    graph.store().set_read_delay(Duration::ZERO);
    graph.load().await.unwrap();
    assert!(graph.snapshot().unwrap().node(&UserId::from("c")).is_some());

    // The slow load finishes without error but its stale result is dropped.
    slow.await.unwrap().unwrap();
    assert!(graph.snapshot().unwrap().node(&UserId::from("c")).is_some());
}

// ============================================================================
// 5. A reload resets hover and prunes a dangling selection
// ============================================================================

#[tokio::test]
async fn test_reload_resets_hover_and_prunes_selection() {
    let store = MemoryStore::seeded(
        vec![profile("me"), profile("b"), profile("x")],
        vec![friend("me", "b")],
    );
    let graph = SocialGraph::with_store(store, UserId::from("me"));
    graph.load().await.unwrap();

    graph.on_node_hover(Some(&UserId::from("b")));
    graph.select(Some(UserId::from("b")));

    graph.load().await.unwrap();
    // Highlight state is ephemeral: a rebuilt graph is back at baseline.
    assert_eq!(graph.hovered(), None);
    let snapshot = graph.snapshot().unwrap();
    let b = snapshot.node(&UserId::from("b")).unwrap();
    assert_eq!(b.size_weight, Tier::Direct.base_weight());
    // Selection survives because b still exists.
    assert_eq!(graph.selected(), Some(UserId::from("b")));

    // Selecting x and then shrinking the roster prunes the selection.
    graph.select(Some(UserId::from("x")));
    graph.store().remove_user(&UserId::from("x"));
    graph.load().await.unwrap();
    assert_eq!(graph.selected(), None);
}
