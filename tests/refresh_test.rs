//! Refresh cycle behaviour across static and stored sources.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gateway_routes::discovery::StaticDiscovery;
use gateway_routes::lifecycle::Shutdown;
use gateway_routes::refresh::{RefreshError, RefreshScheduler, RouteHealth, RouteRefresher, TriggerOutcome};
use gateway_routes::routing::{RouteRecord, RouteResolver, RouteRow, RouteTable, RouteTarget};
use gateway_routes::source::StoredRouteSource;

mod common;
use common::{service_row, static_source, wait_for, MemoryRouteStore};

const TIMEOUT: Duration = Duration::from_secs(1);

fn refresher_with(static_routes: Vec<RouteRecord>, store: Arc<MemoryRouteStore>) -> RouteRefresher {
    RouteRefresher::new(Arc::new(RouteTable::new()))
        .register(static_source(static_routes), TIMEOUT)
        .register(Arc::new(StoredRouteSource::new("store", store)), TIMEOUT)
}

fn resolver_for(refresher: &RouteRefresher) -> RouteResolver {
    RouteResolver::new(refresher.table().clone(), Arc::new(StaticDiscovery::new()))
}

#[tokio::test]
async fn test_stored_route_overrides_static_route() {
    let store = MemoryRouteStore::new(vec![service_row("api", "/api/**", "B")]);
    let refresher = refresher_with(vec![RouteRecord::service("api", "/api/**", "A")], store);

    refresher.refresh().await.unwrap();

    let route = resolver_for(&refresher).resolve("/api/x").unwrap();
    assert_eq!(route.target, RouteTarget::ServiceId("B".into()));
    assert_eq!(refresher.table().snapshot().len(), 1);
}

#[tokio::test]
async fn test_failed_store_keeps_previous_routes() {
    let store = MemoryRouteStore::new(vec![service_row("orders", "/orders/**", "svcOrders")]);
    let refresher = refresher_with(vec![], store.clone());
    let resolver = resolver_for(&refresher);

    refresher.refresh().await.unwrap();
    assert_eq!(refresher.health(), RouteHealth::Ready);

    store.set_failing(true);
    let report = refresher.refresh().await.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].origin, "store");
    assert_eq!(refresher.health(), RouteHealth::Degraded);

    let route = resolver.resolve("/orders/42").unwrap();
    assert_eq!(route.target, RouteTarget::ServiceId("svcOrders".into()));
    assert_eq!(route.stripped_path, "/42");

    store.set_failing(false);
    store.set_rows(vec![]);
    refresher.refresh().await.unwrap();
    assert_eq!(refresher.health(), RouteHealth::Ready);
    assert!(resolver.resolve("/orders/42").is_none());
}

#[tokio::test]
async fn test_unchanged_sources_publish_same_routes() {
    let store = MemoryRouteStore::new(vec![
        service_row("users", "/users/**", "svcUsers"),
        service_row("files", "/files/*", "svcFiles"),
    ]);
    let refresher = refresher_with(vec![RouteRecord::url("docs", "/docs/**", "http://docs.internal:8000")], store);

    refresher.refresh().await.unwrap();
    let first = refresher.table().snapshot();
    refresher.refresh().await.unwrap();
    let second = refresher.table().snapshot();

    assert_eq!(second.generation(), first.generation() + 1);
    let a: Vec<_> = first.records().map(|r| (**r).clone()).collect();
    let b: Vec<_> = second.records().map(|r| (**r).clone()).collect();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_every_published_path_finds_its_record() {
    let store = MemoryRouteStore::new(vec![
        service_row("health", "/health", "svcHealth"),
        service_row("billing", "/billing/invoices", "svcBilling"),
        service_row("catalog", "/catalog", "svcCatalog"),
    ]);
    let refresher = refresher_with(
        vec![
            RouteRecord::service("status", "/status", "svcStatus"),
            RouteRecord::service("health-static", "/health", "svcOld"),
        ],
        store,
    );

    refresher.refresh().await.unwrap();

    let snapshot = refresher.table().snapshot();
    assert_eq!(snapshot.len(), 4);
    for record in snapshot.records() {
        let found = snapshot.find(&record.path).unwrap();
        assert!(Arc::ptr_eq(&found.record, record), "{} resolved elsewhere", record.path);
    }
    // Override kept the static route's position.
    assert_eq!(snapshot.entries()[1].record.id, "health");
}

#[tokio::test]
async fn test_all_sources_failed_then_recovered() {
    let store = MemoryRouteStore::new(vec![service_row("api", "/api/**", "svcApi")]);
    store.set_failing(true);
    let refresher = RouteRefresher::new(Arc::new(RouteTable::new()))
        .register(Arc::new(StoredRouteSource::new("store", store.clone())), TIMEOUT);

    match refresher.refresh().await {
        Err(RefreshError::AllSourcesFailed { failures }) => assert_eq!(failures.len(), 1),
        other => panic!("expected AllSourcesFailed, got {other:?}"),
    }
    assert_eq!(refresher.health(), RouteHealth::AllSourcesFailed);
    assert!(refresher.table().snapshot().is_empty());

    store.set_failing(false);
    let report = refresher.refresh().await.unwrap();
    assert_eq!(report.routes, 1);
    assert_eq!(refresher.health(), RouteHealth::Ready);

    // Failing again after a success serves stale routes instead.
    store.set_failing(true);
    refresher.refresh().await.unwrap();
    assert_eq!(refresher.health(), RouteHealth::Degraded);
    assert_eq!(refresher.table().snapshot().len(), 1);
}

#[tokio::test]
async fn test_slow_source_times_out_alone() {
    let store = MemoryRouteStore::new(vec![service_row("slow", "/slow/**", "svcSlow")]);
    store.set_delay(Duration::from_millis(500));
    let refresher = RouteRefresher::new(Arc::new(RouteTable::new()))
        .register(static_source(vec![RouteRecord::service("fast", "/fast/**", "svcFast")]), TIMEOUT)
        .register(
            Arc::new(StoredRouteSource::new("store", store)),
            Duration::from_millis(50),
        );

    let report = refresher.refresh().await.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].kind, "timeout");
    assert_eq!(report.routes, 1);
    assert_eq!(refresher.health(), RouteHealth::Degraded);
    assert!(refresher.table().snapshot().find("/fast/x").is_some());
}

#[tokio::test]
async fn test_malformed_rows_are_skipped_and_counted() {
    let store = MemoryRouteStore::new(vec![
        service_row("good", "/good/**", "svcGood"),
        RouteRow {
            id: Some("no-target".into()),
            path: Some("/nowhere".into()),
            ..Default::default()
        },
        service_row("relative", "relative/**", "svcRel"),
        service_row("also-good", "/also/**", "svcAlso"),
    ]);
    let refresher = refresher_with(vec![], store);

    let report = refresher.refresh().await.unwrap();
    assert_eq!(report.malformed, 2);
    assert_eq!(report.routes, 2);
    assert!(report.failed.is_empty());
    assert_eq!(refresher.health(), RouteHealth::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_mixed_tables() {
    fn rows(version: &str) -> Vec<RouteRow> {
        (0..20)
            .map(|i| service_row(&format!("r{i}"), &format!("/r{i}/**"), version))
            .collect()
    }

    let store = MemoryRouteStore::new(rows("v1"));
    let refresher = Arc::new(refresher_with(vec![], store.clone()));
    refresher.refresh().await.unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let mut readers = Vec::new();
    for _ in 0..4 {
        let table = refresher.table().clone();
        let done = done.clone();
        readers.push(tokio::spawn(async move {
            let mut checked = 0u64;
            while !done.load(Ordering::Relaxed) {
                let snapshot = table.snapshot();
                let targets: Vec<_> = snapshot.records().map(|r| r.target.clone()).collect();
                assert_eq!(targets.len(), 20);
                assert!(targets.iter().all(|t| *t == targets[0]), "mixed table observed");
                checked += 1;
                tokio::task::yield_now().await;
            }
            checked
        }));
    }

    for i in 0..50 {
        store.set_rows(rows(if i % 2 == 0 { "v2" } else { "v1" }));
        refresher.refresh().await.unwrap();
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }
    assert_eq!(refresher.table().snapshot().generation(), 51);
}

#[tokio::test]
async fn test_trigger_during_cycle_runs_once_afterwards() {
    let store = MemoryRouteStore::new(vec![service_row("api", "/api/**", "v1")]);
    let gate = store.gate();
    let refresher = Arc::new(refresher_with(vec![], store.clone()));

    let in_flight = {
        let refresher = refresher.clone();
        tokio::spawn(async move { refresher.refresh().await })
    };
    wait_for(|| store.fetches() == 1).await;

    assert_eq!(refresher.refresh_now(), TriggerOutcome::Accepted);
    assert_eq!(refresher.refresh_now(), TriggerOutcome::Rejected);

    gate.add_permits(1);
    in_flight.await.unwrap().unwrap();
    store.set_rows(vec![service_row("api", "/api/**", "v2")]);

    // The in-flight cycle started before the trigger, so it is still queued.
    assert!(refresher.is_pending());
    assert_eq!(refresher.table().snapshot().generation(), 1);

    let shutdown = Shutdown::new();
    let scheduler = RefreshScheduler::new(refresher.clone(), Duration::from_secs(3600));
    let handle = tokio::spawn(scheduler.run(shutdown.subscribe()));

    gate.add_permits(10);
    wait_for(|| refresher.table().snapshot().generation() == 2).await;
    assert!(!refresher.is_pending());
    assert_eq!(store.fetches(), 2);

    let snapshot = refresher.table().snapshot();
    let entry = snapshot.find("/api/orders").unwrap();
    assert_eq!(entry.record.target, RouteTarget::ServiceId("v2".into()));

    shutdown.trigger();
    handle.await.unwrap();
    assert_eq!(store.fetches(), 2);
}

/// Let spawned tasks run on the paused clock.
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_refreshes_once_per_tick() {
    let store = MemoryRouteStore::new(vec![service_row("api", "/api/**", "svcApi")]);
    let refresher = Arc::new(refresher_with(vec![], store.clone()));

    let shutdown = Shutdown::new();
    let scheduler = RefreshScheduler::new(refresher.clone(), Duration::from_secs(10));
    let handle = tokio::spawn(scheduler.run(shutdown.subscribe()));
    settle().await;
    assert_eq!(refresher.table().snapshot().generation(), 0);

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(refresher.table().snapshot().generation(), 1);

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(refresher.table().snapshot().generation(), 2);

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(refresher.table().snapshot().generation(), 2);

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(refresher.table().snapshot().generation(), 3);
    assert_eq!(store.fetches(), 3);

    shutdown.trigger();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_tick_during_slow_cycle_does_not_overlap() {
    let store = MemoryRouteStore::new(vec![service_row("api", "/api/**", "svcApi")]);
    store.set_delay(Duration::from_secs(25));
    let refresher = Arc::new(
        RouteRefresher::new(Arc::new(RouteTable::new()))
            .register(Arc::new(StoredRouteSource::new("store", store.clone())), Duration::from_secs(60)),
    );

    let shutdown = Shutdown::new();
    let scheduler = RefreshScheduler::new(refresher.clone(), Duration::from_secs(10));
    let handle = tokio::spawn(scheduler.run(shutdown.subscribe()));
    settle().await;

    // t=10: first cycle starts and blocks in the store until t=35.
    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(store.fetches(), 1);

    // Ticks at t=20 and t=30 land while the cycle is running.
    tokio::time::advance(Duration::from_secs(20)).await;
    settle().await;
    assert_eq!(store.fetches(), 1);
    assert_eq!(refresher.table().snapshot().generation(), 0);

    // t=35: the cycle publishes, then the missed ticks fire as one cycle.
    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(refresher.table().snapshot().generation(), 1);
    assert_eq!(store.fetches(), 2);

    tokio::time::advance(Duration::from_secs(25)).await;
    settle().await;
    assert_eq!(refresher.table().snapshot().generation(), 2);
    assert_eq!(store.max_in_flight(), 1);

    shutdown.trigger();
    handle.await.unwrap();
}
