//! Error path E2E tests.
//!
//! Store failures and deadlines: reads get one retry, writes are attempted
//! once, and a promotion interrupted between its two writes can simply be
//! re-run.

use std::time::Duration;

use pretty_assertions::assert_eq;

use e2e_tests::{fast_policy, TestHarness};
use lifecycle_types::{LifecycleError, LifecycleStatus, RecordType, VectorizerParameters};

#[tokio::test]
async fn test_single_read_failure_is_retried() {
    let harness = TestHarness::new();
    let (dataset, config) = harness.seed("Wiki", "v1.0", "e5").await;
    let gen = harness.production_generation(&dataset.id, &config.id).await;

    harness.faults.heal();
    harness.faults.fail_reads(1);

    let status = harness.manager.get_status(&gen.id).await.unwrap();
    assert_eq!(status, LifecycleStatus::Production);
    assert_eq!(harness.faults.read_calls(), 2);
}

#[tokio::test]
async fn test_persistent_read_failure_surfaces_store_unavailable() {
    let harness = TestHarness::new();
    harness.seed("Wiki", "v1.0", "e5").await;

    harness.faults.heal();
    harness.faults.fail_reads(10);

    let err = harness
        .resolver()
        .resolve_production("Wiki", None)
        .await
        .unwrap_err();

    match err {
        LifecycleError::StoreUnavailable { operation, reason } => {
            assert_eq!(operation, r#"query dataset where name = "Wiki""#);
            assert!(reason.contains("injected read failure"));
        }
        other => panic!("expected StoreUnavailable, got {:?}", other),
    }
    assert_eq!(harness.faults.read_calls(), 2);
}

#[tokio::test]
async fn test_failed_write_is_not_retried() {
    let harness = TestHarness::new();

    harness.faults.heal();
    harness.faults.fail_writes_after(0);

    let err = harness
        .manager
        .create_dataset("Wiki", "v1.0")
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(
        err.to_string().starts_with("Metadata store unavailable during put dataset "),
        "unexpected error: {}",
        err
    );
    assert_eq!(harness.faults.write_calls(), 1);

    harness.faults.heal();
    assert!(harness.manager.find_datasets("Wiki").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_slow_store_exceeds_deadline() {
    let harness = TestHarness::with_policy(
        fast_policy()
            .with_timeout(Duration::from_millis(50))
            .without_read_retry(),
    );

    harness.faults.set_delay(Duration::from_millis(500));
    let err = harness
        .manager
        .get_index_generation("gen-slow-1")
        .await
        .unwrap_err();

    match err {
        LifecycleError::StoreUnavailable { operation, reason } => {
            assert_eq!(operation, "get index generation gen-slow-1");
            assert!(reason.contains("deadline"), "unexpected reason: {}", reason);
        }
        other => panic!("expected StoreUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_reference_is_not_retried() {
    let harness = TestHarness::new();
    let (_, config) = harness.seed("Wiki", "v1.0", "e5").await;

    harness.faults.heal();
    let err = harness
        .manager
        .create_index_generation("no-such-dataset", &config.id)
        .await
        .unwrap_err();

    match err {
        LifecycleError::UnknownReference { kind, id } => {
            assert_eq!(kind, RecordType::Dataset);
            assert_eq!(id, "no-such-dataset");
        }
        other => panic!("expected UnknownReference, got {:?}", other),
    }
    assert_eq!(harness.faults.read_calls(), 1);
    assert_eq!(harness.faults.write_calls(), 0);
}

/// Demotion lands, the target write fails: the dataset briefly has no
/// production generation, and re-running the promotion completes it.
#[tokio::test]
async fn test_interrupted_promotion_can_be_rerun() {
    let harness = TestHarness::new();
    let (dataset, config) = harness.seed("Wiki", "v1.0", "e5").await;
    let incumbent = harness.production_generation(&dataset.id, &config.id).await;
    let candidate = harness.staged_generation(&dataset.id, &config.id).await;

    harness.faults.heal();
    harness.faults.fail_writes_after(1);

    let err = harness
        .manager
        .promote(&candidate.id, LifecycleStatus::Production)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::StoreUnavailable { .. }));
    assert_eq!(harness.faults.write_calls(), 2);

    harness.faults.heal();
    assert_eq!(
        harness.manager.get_status(&incumbent.id).await.unwrap(),
        LifecycleStatus::Deprecated
    );
    assert_eq!(
        harness.manager.get_status(&candidate.id).await.unwrap(),
        LifecycleStatus::Staging
    );
    assert!(matches!(
        harness.resolver().resolve_production("Wiki", None).await,
        Err(LifecycleError::NoProductionIndex { .. })
    ));

    harness
        .manager
        .promote(&candidate.id, LifecycleStatus::Production)
        .await
        .unwrap();
    let production = harness.production_of(&dataset.id).await;
    assert_eq!(production.len(), 1);
    assert_eq!(production[0].id, candidate.id);
}

/// Demotion write fails: nothing changes and the incumbent keeps serving.
#[tokio::test]
async fn test_failed_demotion_leaves_incumbent_serving() {
    let harness = TestHarness::new();
    let (dataset, config) = harness.seed("Wiki", "v1.0", "e5").await;
    let incumbent = harness.production_generation(&dataset.id, &config.id).await;
    let candidate = harness.staged_generation(&dataset.id, &config.id).await;

    harness.faults.heal();
    harness.faults.fail_writes_after(0);
    assert!(harness
        .manager
        .promote(&candidate.id, LifecycleStatus::Production)
        .await
        .is_err());

    harness.faults.heal();
    let handle = harness.resolver().resolve_production("Wiki", None).await.unwrap();
    assert_eq!(handle, incumbent.physical_index_handle);
}

#[tokio::test]
async fn test_invalid_config_never_reaches_store() {
    let harness = TestHarness::new();
    harness.faults.heal();

    for (size, overlap) in [(0, 0), (100, 100), (100, 150)] {
        let err = harness
            .manager
            .register_embedding_config("m", size, overlap, VectorizerParameters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidConfig(_)));
    }
    assert_eq!(harness.faults.write_calls(), 0);
    assert_eq!(harness.faults.read_calls(), 0);
}
