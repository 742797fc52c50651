//! Hierarchical scope resolution tests
//!
//! Exercises the test-run → worker → feature scope chain used by runner
//! adapters: one-time setup under concurrent first access, parent-first
//! initialization, ancestor fallback, and actionable resolution errors.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use screenplay::screenplay::resolver::{Service, ServiceRegistry};
use screenplay::screenplay::scope::{ScopeLevel, ScopedServices};

#[derive(Debug)]
struct DatabaseHandle {
    connection_string: &'static str,
}

impl Service for DatabaseHandle {}

struct WorkerSlot {
    index: usize,
}

impl Service for WorkerSlot {}

#[test]
fn resolution_searches_ancestors() {
    let mut run_registry = ServiceRegistry::new();
    run_registry.register_instance(Arc::new(DatabaseHandle {
        connection_string: "postgres://test-run",
    }));
    let run = ScopedServices::root(ScopeLevel::TestRun, Arc::new(run_registry), None);

    let mut worker_registry = ServiceRegistry::new();
    worker_registry.register_instance(Arc::new(WorkerSlot { index: 3 }));
    let worker = ScopedServices::child(&run, ScopeLevel::Worker, Arc::new(worker_registry), None);

    let feature = ScopedServices::child(
        &worker,
        ScopeLevel::Feature,
        Arc::new(ServiceRegistry::new()),
        None,
    );

    assert_eq!(feature.resolve::<WorkerSlot>().unwrap().index, 3);
    assert_eq!(
        feature.resolve::<DatabaseHandle>().unwrap().connection_string,
        "postgres://test-run"
    );
}

#[test]
fn missing_contract_error_is_actionable() {
    let run = ScopedServices::root(
        ScopeLevel::TestRun,
        Arc::new(ServiceRegistry::new()),
        None,
    );
    let worker = ScopedServices::child(
        &run,
        ScopeLevel::Worker,
        Arc::new(ServiceRegistry::new()),
        None,
    );

    let err = worker.resolve::<DatabaseHandle>().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("DatabaseHandle"));
    assert!(message.contains("worker"));
}

#[test]
fn concurrent_first_requests_run_setup_once() {
    let setups = Arc::new(AtomicUsize::new(0));

    let mut registry = ServiceRegistry::new();
    registry.register_instance(Arc::new(DatabaseHandle {
        connection_string: "postgres://shared",
    }));

    let counted = setups.clone();
    let scope = ScopedServices::root(
        ScopeLevel::TestRun,
        Arc::new(registry),
        Some(Box::new(move |_| {
            // Widen the race window.
            std::thread::sleep(std::time::Duration::from_millis(10));
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })),
    );

    let barrier = Arc::new(std::sync::Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scope = scope.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                scope.resolve::<DatabaseHandle>().unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(setups.load(Ordering::SeqCst), 1);
}

#[test]
fn scope_release_disposes_only_own_instances() {
    static DISPOSALS: AtomicUsize = AtomicUsize::new(0);

    struct FeatureFixture;
    impl Service for FeatureFixture {
        fn dispose(&self) {
            DISPOSALS.fetch_add(1, Ordering::SeqCst);
        }
    }

    let mut run_registry = ServiceRegistry::new();
    run_registry.register_instance(Arc::new(DatabaseHandle {
        connection_string: "postgres://test-run",
    }));
    let run = ScopedServices::root(ScopeLevel::TestRun, Arc::new(run_registry), None);

    let mut feature_registry = ServiceRegistry::new();
    feature_registry.register_per_scenario(|_| FeatureFixture);
    let feature = ScopedServices::child(
        &run,
        ScopeLevel::Feature,
        Arc::new(feature_registry),
        None,
    );

    feature.resolve::<FeatureFixture>().unwrap();
    feature.resolve::<DatabaseHandle>().unwrap();
    feature.release();
    run.release();

    assert_eq!(DISPOSALS.load(Ordering::SeqCst), 1);
}
