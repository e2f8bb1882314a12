//! Contract Test: Failures Are Terminal
//!
//! Constraints verified:
//! - Zone service failures surface as ZoneService errors
//! - A failed submission is attempted exactly once
//! - A failed lookup is never followed by a submission
//! - Failures are not masked as success

mod common;

use common::*;
use lifecycle_dns_core::event::LifecycleEvent;
use lifecycle_dns_core::Error;

#[tokio::test]
async fn rejected_change_is_not_retried() {
    let directory = StubInstanceDirectory::with_instance(INSTANCE_ID, Some(NEW_ADDRESS), web1_tags());
    let zone = RecordingZoneService::new(Some(web1_placeholder()))
        .with_submit_failure("AccessDenied: not authorized to change record sets");
    let engine = engine_over(&directory, &zone, Some(DOMAIN));

    let err = engine
        .handle(&LifecycleEvent::new(INSTANCE_ID, "running"))
        .await
        .expect_err("rejected change must fail");

    match err {
        Error::ZoneService { provider, message } => {
            assert_eq!(provider, "recording");
            assert!(message.contains("AccessDenied"));
        }
        other => panic!("expected ZoneService, got {}", other),
    }
    assert_eq!(zone.submit_call_count(), 1, "exactly one attempt");
    assert_eq!(zone.live_record(), Some(web1_placeholder()));
}

#[tokio::test]
async fn rejected_delete_is_surfaced() {
    // The live value may have moved on since it was read
    let directory = StubInstanceDirectory::with_instance(INSTANCE_ID, None, web1_tags());
    let zone = RecordingZoneService::new(Some(web1_placeholder()))
        .with_submit_failure("InvalidChangeBatch: record set values do not match");
    let engine = engine_over(&directory, &zone, Some(DOMAIN));

    let err = engine
        .handle(&LifecycleEvent::new(INSTANCE_ID, "stopping"))
        .await
        .expect_err("rejected delete must fail");

    assert!(matches!(err, Error::ZoneService { .. }), "got {}", err);
    assert_eq!(zone.submit_call_count(), 1);
}

#[tokio::test]
async fn lookup_failure_is_wrapped_and_stops_the_invocation() {
    let directory = StubInstanceDirectory::with_instance(INSTANCE_ID, Some(NEW_ADDRESS), web1_tags());
    let zone = RecordingZoneService::new(Some(web1_placeholder())).with_lookup_failure("Throttling");
    let engine = engine_over(&directory, &zone, Some(DOMAIN));

    let err = engine
        .handle(&LifecycleEvent::new(INSTANCE_ID, "running"))
        .await
        .expect_err("lookup failure must fail");

    match err {
        Error::ZoneService { provider, message } => {
            assert_eq!(provider, "recording");
            assert!(message.contains("Throttling"));
        }
        other => panic!("expected ZoneService, got {}", other),
    }
    assert_eq!(zone.find_call_count(), 1);
    assert_eq!(zone.submit_call_count(), 0);
}
