//! Routing and lifecycle tests against the application route table.

use std::time::Duration;

use strategy_tracker::backend::Backend;
use strategy_tracker::dom::Document;
use strategy_tracker::layout::PAGE_ROOT_ID;
use strategy_tracker::pages::{
    asset_edit, dashboard, index, login, not_found, strategy, strategy_edit,
};
use strategy_tracker::routing::MatchSource;

mod common;
use common::Harness;

#[tokio::test]
async fn test_root_renders_index() {
    let mut h = Harness::new();
    let settled = h.navigate("#/").await;

    let last = settled.last().unwrap();
    assert_eq!(last.path, "/");
    assert_eq!(last.kind, "exact");
    assert_eq!(h.title(), index::TITLE);
    assert!(h.document.contains(PAGE_ROOT_ID));
}

#[tokio::test]
async fn test_empty_fragment_resolves_to_root() {
    let h = Harness::new();
    let nav = h.router.handle_route();
    assert_eq!(nav.path, "/");
    assert_eq!(nav.title, index::TITLE);
    nav.finished().await;

    h.document.set_location_hash("#");
    let nav = h.router.handle_route();
    assert_eq!(nav.path, "/");
    nav.finished().await;
}

#[tokio::test]
async fn test_edit_pattern_wins_over_detail() {
    let h = Harness::new();

    h.document.set_location_hash("#/strategies/edit/42");
    let nav = h.router.handle_route();
    assert_eq!(nav.title, strategy_edit::TITLE);
    assert_eq!(nav.source, MatchSource::Dynamic(0));
    assert_eq!(nav.params.get("id"), Some("42"));
    nav.finished().await;

    h.document.set_location_hash("#/strategies/abc123");
    let nav = h.router.handle_route();
    assert_eq!(nav.title, strategy::TITLE);
    assert_eq!(nav.params.get("id"), Some("abc123"));
    nav.finished().await;
}

#[tokio::test]
async fn test_unknown_path_renders_fallback() {
    let mut h = Harness::new();
    let settled = h.navigate("#/nonexistent-path").await;

    let last = settled.last().unwrap();
    assert_eq!(last.kind, "fallback");
    assert_eq!(h.title(), not_found::TITLE);
    assert!(!settled.truncated);
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let h = Harness::new();
    for path in ["/dashboard", "/assets/edit/3", "/nope"] {
        let first = h.router.table().resolve(path);
        let second = h.router.table().resolve(path);
        assert_eq!(first.source, second.source);
        assert_eq!(first.page.title(), second.page.title());
    }
    assert_eq!(h.router.table().resolve("/assets/edit/3").page.title(), asset_edit::TITLE);
}

#[tokio::test]
async fn test_query_does_not_affect_matching() {
    let mut h = Harness::signed_in("alice@example.com").await;
    let settled = h.navigate("#/dashboard?tab=1").await;
    let last = settled.last().unwrap();
    assert_eq!(last.path, "/dashboard?tab=1");
    assert_eq!(last.title, dashboard::TITLE);
}

#[tokio::test]
async fn test_guard_redirects_to_login() {
    let mut h = Harness::new();
    let settled = h.navigate("#/dashboard").await;

    let paths: Vec<&str> = settled.navigations.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(paths, ["/dashboard", "/login"]);
    assert_eq!(h.hash(), "#/login");
    assert_eq!(h.title(), login::TITLE);
}

#[tokio::test]
async fn test_each_navigation_gets_its_own_id() {
    let mut h = Harness::new();
    let first = h.navigate("#/").await;
    let second = h.navigate("#/register").await;
    assert_ne!(first.last().unwrap().id, second.last().unwrap().id);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_navigations_keep_latest_markup() {
    let h = Harness::signed_in("alice@example.com").await;
    let alice = h.user_id("alice@example.com");
    let strategy_id = h.backend.user_strategies(&alice).await.unwrap()[0].id.clone();

    h.backend.set_latency(Duration::from_millis(200));

    h.document.set_location_hash(&format!("#/strategies/{}", strategy_id));
    let first = h.router.handle_route();
    h.document.set_location_hash("#/strategies/999");
    let second = h.router.handle_route();

    // Both shells rendered in order; the second is mounted.
    assert!(first.token.is_cancelled());
    assert_eq!(h.title(), strategy::TITLE);

    first.finished().await;
    second.finished().await;

    // The superseded init found its strategy but could not write it.
    assert!(h.html("strategy-section").contains("Strategy not found"));
    assert!(!h.html("strategy-section").contains("Dividend Growth"));
}

#[tokio::test]
async fn test_mount_missing_is_a_no_op() {
    use std::sync::Arc;
    use strategy_tracker::backend::{BackendHandle, MemoryBackend};
    use strategy_tracker::dom::MemoryDocument;
    use strategy_tracker::{build_route_table, Router};

    let (doc, _rx) = MemoryDocument::detached("#/");
    let doc = Arc::new(doc);
    let router = Router::new(
        Arc::new(build_route_table().unwrap()),
        doc.clone(),
        BackendHandle::with_backend(Arc::new(MemoryBackend::seeded())),
        "app",
    );

    let nav = router.handle_route();
    assert_eq!(doc.element_count(), 0);
    assert_eq!(doc.title(), index::TITLE);
    nav.finished().await;
}
