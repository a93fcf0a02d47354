//! Navigation churn: many cycles in flight against a slow backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use strategy_tracker::backend::{Backend, BackendHandle, MemoryBackend};
use strategy_tracker::config::{BackendConfig, BackendMode};
use strategy_tracker::dom::{Document, MemoryDocument};
use strategy_tracker::pages::strategy;
use strategy_tracker::{build_route_table, Router, Shutdown};

mod common;
use common::{Harness, MOUNT_ID};

#[tokio::test(start_paused = true)]
async fn test_navigation_churn_only_latest_writes() {
    let h = Harness::signed_in("alice@example.com").await;
    let alice = h.user_id("alice@example.com");
    let strategy_id = h.backend.user_strategies(&alice).await.unwrap()[0].id.clone();
    h.backend.set_latency(Duration::from_millis(50));

    let cycles = 200;
    let start = Instant::now();
    let mut navigations = Vec::with_capacity(cycles);
    for i in 0..cycles {
        // Even cycles point at a strategy that does not exist.
        let hash = if i % 2 == 0 {
            format!("#/strategies/missing-{}", i)
        } else {
            format!("#/strategies/{}?n={}", strategy_id, i)
        };
        h.document.set_location_hash(&hash);
        navigations.push(h.router.handle_route());
    }
    let dispatch = start.elapsed();

    let live: Vec<_> = navigations
        .iter()
        .filter(|nav| !nav.token.is_cancelled())
        .collect();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].path, navigations[cycles - 1].path);

    for nav in navigations {
        nav.finished().await;
    }

    assert_eq!(h.title(), strategy::TITLE);
    assert_eq!(h.text("strategy-title"), "Dividend Growth");
    assert_eq!(h.text("strategy-asset-count"), "2");
    assert!(!h.html("strategy-section").contains("Strategy not found"));

    println!("\n--- Navigation Churn ---");
    println!("Cycles:          {}", cycles);
    println!("Dispatch time:   {:?}", dispatch);
    println!("------------------------\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_builds_one_client() {
    let handle = BackendHandle::from_config(BackendConfig {
        mode: BackendMode::Memory,
        ..BackendConfig::default()
    });

    let mut tasks = Vec::new();
    for _ in 0..64 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move { handle.client().await }));
    }

    let mut clients: Vec<Arc<dyn Backend>> = Vec::new();
    for task in tasks {
        clients.push(task.await.unwrap().unwrap());
    }

    assert_eq!(handle.initializations(), 1);
    assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
}

#[tokio::test]
async fn test_run_handles_every_queued_change_before_shutdown() {
    let (document, changes) = MemoryDocument::new(MOUNT_ID);
    let document = Arc::new(document);
    let backend = BackendHandle::with_backend(Arc::new(MemoryBackend::seeded()));
    let router = Router::new(
        Arc::new(build_route_table().unwrap()),
        document.clone(),
        backend,
        MOUNT_ID,
    );

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();

    let changes_sent = 500;
    for i in 0..changes_sent {
        let hash = if i % 2 == 0 { "#/register" } else { "#/" };
        document.set_location_hash(hash);
    }
    shutdown.trigger();

    let start = Instant::now();
    let cycles = router.run(changes, stop).await;
    let duration = start.elapsed();

    assert_eq!(cycles, changes_sent + 1);
    assert_eq!(document.location_hash(), "#/");

    println!("\n--- Router Loop ---");
    println!("Cycles:          {}", cycles);
    println!("Total Duration:  {:?}", duration);
    println!("Cycles/sec:      {:.2}", cycles as f64 / duration.as_secs_f64());
    println!("-------------------\n");
}
