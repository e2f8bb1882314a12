//! Contract Test: Lifecycle State → DNS Action
//!
//! Constraints verified:
//! - `running` maps to UPSERT and `stopping` maps to DELETE
//! - Any other state fails with UnrecognizedState
//! - An unrecognized state is rejected before any collaborator is called

mod common;

use common::*;
use lifecycle_dns_core::event::{DnsAction, LifecycleEvent, action_for_state, interpret};
use lifecycle_dns_core::Error;

#[test]
fn recognized_states_are_a_total_mapping() {
    assert_eq!(action_for_state("running").unwrap(), DnsAction::Upsert);
    assert_eq!(action_for_state("stopping").unwrap(), DnsAction::Delete);

    let event = LifecycleEvent::new(INSTANCE_ID, "running");
    assert_eq!(interpret(&event).unwrap(), DnsAction::Upsert);
}

#[test]
fn lookup_uses_the_event_state_not_a_fixed_key() {
    // A literal-key lookup would fail for every event, or succeed for none
    let running = LifecycleEvent::new(INSTANCE_ID, "running");
    let stopping = LifecycleEvent::new(INSTANCE_ID, "stopping");
    assert_ne!(interpret(&running).unwrap(), interpret(&stopping).unwrap());

    let literal = LifecycleEvent::new(INSTANCE_ID, "state");
    assert!(matches!(interpret(&literal), Err(Error::UnrecognizedState(_))));
}

#[tokio::test]
async fn unrecognized_state_makes_no_external_call() {
    for state in ["pending", "stopped", "shutting-down", "terminated", "RUNNING"] {
        let directory = StubInstanceDirectory::with_instance(INSTANCE_ID, Some(NEW_ADDRESS), web1_tags());
        let zone = RecordingZoneService::new(Some(web1_placeholder()));
        let engine = engine_over(&directory, &zone, Some(DOMAIN));

        let err = engine
            .handle(&LifecycleEvent::new(INSTANCE_ID, state))
            .await
            .expect_err("unrecognized state must fail");

        assert!(err.is_input_error());
        match err {
            Error::UnrecognizedState(s) => assert_eq!(s, state),
            other => panic!("expected UnrecognizedState for {}, got {}", state, other),
        }
        assert_eq!(directory.describe_call_count(), 0, "directory called for {}", state);
        assert_eq!(zone.find_call_count(), 0, "zone lookup for {}", state);
        assert_eq!(zone.submit_call_count(), 0, "zone submit for {}", state);
    }
}

#[tokio::test]
async fn event_without_instance_id_is_invalid() {
    let directory = StubInstanceDirectory::empty();
    let zone = RecordingZoneService::new(Some(web1_placeholder()));
    let engine = engine_over(&directory, &zone, Some(DOMAIN));

    let err = engine
        .handle(&LifecycleEvent::new("", "running"))
        .await
        .expect_err("missing instance id must fail");

    assert!(matches!(err, Error::InvalidEvent(_)));
    assert_eq!(directory.describe_call_count(), 0);
}
