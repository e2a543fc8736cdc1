//! Mapping scheduler ordering, identity flow and failure modes

mod common;

use aclgate_authority::{AclQuery, AuthorityError, EngineConfig, MappingScheduler};
use aclgate_core::{ConnectorError, UserRecord};
use common::{authorized, Harness, HarnessBuilder, MapperScript};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn scheduler(harness: &Harness, detect_cycles: bool) -> MappingScheduler {
    MappingScheduler::new(harness.mapping_pool.queue(), detect_cycles)
}

/// Every mapper started only after each of its prerequisites finished
fn assert_topological(harness: &Harness) {
    for mapper in &harness.mappers {
        let started = harness
            .recorder
            .started_at(&mapper.name)
            .unwrap_or_else(|| panic!("{} never ran", mapper.name));
        for prerequisite in &mapper.prerequisites {
            let finished = harness
                .recorder
                .finished_at(prerequisite)
                .unwrap_or_else(|| panic!("{} never finished", prerequisite));
            assert!(
                finished < started,
                "{} started before prerequisite {} finished",
                mapper.name,
                prerequisite
            );
        }
    }
}

#[tokio::test]
async fn test_no_mappers_keeps_identity() {
    let harness = HarnessBuilder::new().build();
    let user = UserRecord::new("corp", "bob");

    let outcome = scheduler(&harness, false)
        .run(&[], &user, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.identity, user);
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn test_diamond_runs_in_dependency_order() {
    // d waits for b and c, which both wait for a; registered sinks-first
    let harness = HarnessBuilder::new()
        .mapper("d", &["b", "c"], MapperScript::suffix("-d"))
        .mapper_with("c", &["a"], MapperScript::suffix("-c"), Duration::from_millis(30))
        .mapper("b", &["a"], MapperScript::suffix("-b"))
        .mapper_with("a", &[], MapperScript::suffix("-a"), Duration::from_millis(10))
        .build();

    let outcome = scheduler(&harness, false)
        .run(&harness.mappers, &UserRecord::new("", "u"), &CancellationToken::new())
        .await
        .unwrap();

    assert_topological(&harness);
    assert_eq!(harness.recorder.inputs("b"), vec![UserRecord::new("", "u-a")]);
    assert_eq!(harness.recorder.inputs("c"), vec![UserRecord::new("", "u-a")]);
    // Last prerequisite in name order feeds a multi-prerequisite mapper
    assert_eq!(harness.recorder.inputs("d"), vec![UserRecord::new("", "u-a-c")]);
    assert_eq!(outcome.identity, UserRecord::new("", "u-a-c-d"));
}

#[tokio::test]
async fn test_independent_mappers_last_registered_wins() {
    let harness = HarnessBuilder::new()
        .mapper("first", &[], MapperScript::suffix("-1"))
        .mapper_with("second", &[], MapperScript::suffix("-2"), Duration::from_millis(20))
        .build();

    let outcome = scheduler(&harness, false)
        .run(&harness.mappers, &UserRecord::new("", "u"), &CancellationToken::new())
        .await
        .unwrap();

    // Both see the original identity; no mapper feeds the other
    assert_eq!(harness.recorder.inputs("first"), vec![UserRecord::new("", "u")]);
    assert_eq!(harness.recorder.inputs("second"), vec![UserRecord::new("", "u")]);
    assert_eq!(outcome.identity, UserRecord::new("", "u-2"));
}

#[tokio::test]
async fn test_failures_are_collected_not_raised() {
    let harness = HarnessBuilder::new()
        .mapper("broken", &[], MapperScript::Fail(ConnectorError::domain("no such user")))
        .build();
    let user = UserRecord::new("", "u");

    let outcome = scheduler(&harness, false)
        .run(&harness.mappers, &user, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.identity, user);
    assert_eq!(
        outcome.failures,
        vec![("broken".to_string(), ConnectorError::domain("no such user"))]
    );
}

#[tokio::test]
async fn test_unknown_prerequisite_fails_fast() {
    let harness = HarnessBuilder::new()
        .mapper_with("slow", &[], MapperScript::suffix("-s"), Duration::from_millis(50))
        .mapper("typo", &["slow", "missing"], MapperScript::suffix("-t"))
        .build();

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        scheduler(&harness, false).run(
            &harness.mappers,
            &UserRecord::new("", "u"),
            &CancellationToken::new(),
        ),
    )
    .await
    .expect("scheduler must not hang")
    .unwrap_err();

    assert!(
        err.to_string().contains("unknown prerequisite 'missing'"),
        "{}",
        err
    );
    assert!(harness.recorder.inputs("typo").is_empty());
}

#[tokio::test]
async fn test_cycle_rejected_when_detection_enabled() {
    let harness = HarnessBuilder::new()
        .mapper("a", &["b"], MapperScript::suffix("-a"))
        .mapper("b", &["a"], MapperScript::suffix("-b"))
        .build();

    let err = scheduler(&harness, true)
        .run(&harness.mappers, &UserRecord::new("", "u"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthorityError::Configuration(_)), "{:?}", err);
    assert!(harness.recorder.events().is_empty());
}

#[tokio::test]
async fn test_cycle_waits_until_cancelled() {
    let harness = HarnessBuilder::new()
        .mapper("a", &["b"], MapperScript::suffix("-a"))
        .mapper("b", &["a"], MapperScript::suffix("-b"))
        .build();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = scheduler(&harness, false)
        .run(&harness.mappers, &UserRecord::new("", "u"), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthorityError::Cancelled));
    assert!(harness.recorder.events().is_empty());
}

#[tokio::test]
async fn test_cycle_bounded_by_request_timeout() {
    let harness = HarnessBuilder::new()
        .config(EngineConfig {
            request_timeout: Some(Duration::from_millis(100)),
            detect_mapping_cycles: false,
        })
        .mapper("a", &["b"], MapperScript::suffix("-a"))
        .mapper("b", &["a"], MapperScript::suffix("-b"))
        .authority("ad", authorized(&["t"]))
        .build();

    let err = harness
        .service
        .resolve(&AclQuery::new("alice"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthorityError::Timeout(_)), "{:?}", err);
    assert!(harness.recorder.inputs("ad").is_empty());
}

#[tokio::test]
async fn test_cycle_with_detection_through_service() {
    let harness = HarnessBuilder::new()
        .config(EngineConfig {
            request_timeout: None,
            detect_mapping_cycles: true,
        })
        .mapper("a", &["c"], MapperScript::suffix("-a"))
        .mapper("b", &["a"], MapperScript::suffix("-b"))
        .mapper("c", &["b"], MapperScript::suffix("-c"))
        .build();

    let err = harness
        .service
        .resolve(&AclQuery::new("alice"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AuthorityError::Configuration(_)), "{:?}", err);
}
