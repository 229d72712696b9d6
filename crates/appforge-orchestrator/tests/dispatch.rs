//! Acceptance, scheduling and supervision

mod common;

use appforge_core::{AppforgeError, RequestKind, TaskId, TaskStatus};
use appforge_orchestrator::{Dispatcher, InMemorySecretRegistry, RunScheduler, TaskStore};
use common::{
    files, request, Harness, MockGenerator, MockNotifier, MockPublisher, PanickingGenerator,
    SlowGenerator,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn dispatcher<G>(h: &Harness<G>, max_concurrent_runs: usize) -> Dispatcher
where
    G: appforge_clients::CodeGenerator + 'static,
{
    Dispatcher::new(
        Arc::new(InMemorySecretRegistry::new()),
        RunScheduler::new(h.orchestrator.clone(), max_concurrent_runs),
    )
}

fn default_harness() -> Harness {
    Harness::new(
        MockGenerator::returning(files(&["index.html"])),
        MockPublisher::default(),
        MockNotifier::delivering(true),
    )
}

#[tokio::test]
async fn test_accept_build_then_complete() {
    let h = default_harness();
    let d = dispatcher(&h, 4);

    let (id, handle) = d.submit(RequestKind::Build, request("alpha", 1)).unwrap();
    assert_eq!(id, TaskId::from("alpha-1"));

    assert_eq!(handle.await.unwrap(), TaskStatus::Completed);
    assert_eq!(d.status(&id).unwrap().status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_record_is_processing_on_acceptance() {
    let h = Harness::new(
        SlowGenerator::default(),
        MockPublisher::default(),
        MockNotifier::delivering(true),
    );
    let d = dispatcher(&h, 1);

    let id = d.accept(RequestKind::Build, request("alpha", 1)).unwrap();
    assert_eq!(d.status(&id).unwrap().status, TaskStatus::Processing);
}

#[tokio::test]
async fn test_wrong_round_is_validation_error() {
    let h = default_harness();
    let d = dispatcher(&h, 4);

    let err = d.accept(RequestKind::Build, request("alpha", 2)).unwrap_err();
    assert!(matches!(err, AppforgeError::Validation(_)));

    let err = d.accept(RequestKind::Revision, request("alpha", 1)).unwrap_err();
    assert!(matches!(err, AppforgeError::Validation(_)));

    assert!(!h.store.contains(&TaskId::from("alpha-1")));
    assert!(!h.store.contains(&TaskId::from("alpha-2")));
}

#[tokio::test]
async fn test_secret_mismatch_is_auth_error() {
    let h = default_harness();
    let d = dispatcher(&h, 4);

    d.accept(RequestKind::Build, request("alpha", 1)).unwrap();

    let mut other = request("beta", 1);
    other.secret = "wrong".into();
    let err = d.accept(RequestKind::Build, other).unwrap_err();
    assert!(matches!(err, AppforgeError::Auth(_)));
    assert!(!h.store.contains(&TaskId::from("beta-1")));
}

#[tokio::test]
async fn test_revision_requires_round_one_record() {
    let h = default_harness();
    let d = dispatcher(&h, 4);

    let err = d
        .accept(RequestKind::Revision, request("alpha", 2))
        .unwrap_err();
    assert!(matches!(err, AppforgeError::NotFound(_)));
    assert!(!h.store.contains(&TaskId::from("alpha-2")));
}

#[tokio::test]
async fn test_revision_accepted_while_round_one_processing() {
    let h = Harness::new(
        SlowGenerator::default(),
        MockPublisher::default(),
        MockNotifier::delivering(true),
    );
    let d = dispatcher(&h, 4);

    let (_, build) = d.submit(RequestKind::Build, request("alpha", 1)).unwrap();
    assert_eq!(
        d.status(&TaskId::from("alpha-1")).unwrap().status,
        TaskStatus::Processing
    );

    // Existence, not completion, is the precondition
    let (id, revision) = d.submit(RequestKind::Revision, request("alpha", 2)).unwrap();
    assert_eq!(id, TaskId::from("alpha-2"));

    assert_eq!(build.await.unwrap(), TaskStatus::Completed);
    // The revision may have looked for the repository before round 1 recorded it
    let status = revision.await.unwrap();
    assert!(matches!(status, TaskStatus::Completed | TaskStatus::Failed));
    assert_eq!(d.status(&id).unwrap().status, status);
}

#[tokio::test]
async fn test_panicking_run_is_marked_failed() {
    let h = Harness::new(
        PanickingGenerator,
        MockPublisher::default(),
        MockNotifier::delivering(true),
    );
    let d = dispatcher(&h, 2);

    let (id, handle) = d.submit(RequestKind::Build, request("alpha", 1)).unwrap();

    assert_eq!(handle.await.unwrap(), TaskStatus::Failed);
    assert_eq!(d.status(&id).unwrap().status, TaskStatus::Failed);
    assert!(h.notifier.submitted().is_empty());
}

#[tokio::test]
async fn test_concurrent_runs_are_bounded() {
    let h = Harness::new(
        SlowGenerator::default(),
        MockPublisher::default(),
        MockNotifier::delivering(true),
    );
    let d = dispatcher(&h, 2);
    assert_eq!(d.scheduler().max_concurrent_runs(), 2);

    let handles: Vec<_> = (0..6)
        .map(|i| {
            d.submit(RequestKind::Build, request(&format!("task{}", i), 1))
                .unwrap()
                .1
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), TaskStatus::Completed);
    }

    assert_eq!(h.generator.peak.load(Ordering::SeqCst), 2);
    assert_eq!(d.scheduler().active_runs(), 0);
}

#[test]
fn test_zero_limit_is_clamped() {
    let h = default_harness();
    let scheduler = RunScheduler::new(h.orchestrator.clone(), 0);
    assert_eq!(scheduler.max_concurrent_runs(), 1);
}
