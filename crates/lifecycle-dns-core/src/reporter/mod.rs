//! Audit reporting
//!
//! Each invocation leaves three audit lines: the event as received, the
//! change batch just before submission, and the final result or failure.
//! A payload that never becomes an event leaves one `rejected` line holding
//! the raw text and the error.
//! All are emitted under the `lifecycle_dns::audit` target with the JSON
//! rendering in the `payload` field.
//!
//! Reporting never fails and never alters control flow. Values that cannot
//! be rendered as JSON fall back to their `Debug` form.

use serde::Serialize;
use std::fmt::Debug;
use tracing::{error, info};

use crate::error::Error;
use crate::event::LifecycleEvent;
use crate::reconciler::ChangeResult;
use crate::traits::ChangeBatch;

/// Tracing target for audit lines
pub const AUDIT_TARGET: &str = "lifecycle_dns::audit";

#[derive(Serialize)]
struct AuditRecord<'a> {
    event: &'a LifecycleEvent,
    result: &'a ChangeResult,
}

#[derive(Serialize)]
struct FailureRecord<'a> {
    event: &'a LifecycleEvent,
    error: String,
}

#[derive(Serialize)]
struct RejectedRecord<'a> {
    payload: &'a str,
    error: String,
}

/// Render a value as compact JSON, falling back to `Debug`
pub fn render<T: Serialize + Debug>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}

/// Render the result an invocation hands back to its trigger
pub fn render_result(result: &ChangeResult) -> String {
    render(result)
}

/// Audit payload for a finished invocation
pub fn result_payload(event: &LifecycleEvent, result: &ChangeResult) -> String {
    render_record(&AuditRecord { event, result })
}

/// Audit payload for a failed invocation
pub fn failure_payload(event: &LifecycleEvent, err: &Error) -> String {
    render_record(&FailureRecord {
        event,
        error: err.to_string(),
    })
}

/// Audit payload for input that could not be read as an event
pub fn rejected_payload(raw: &str, err: &Error) -> String {
    render_record(&RejectedRecord {
        payload: raw,
        error: err.to_string(),
    })
}

/// Record the event as received
pub fn report_event(event: &LifecycleEvent) {
    info!(target: AUDIT_TARGET, payload = %render(event), "event");
}

/// Record the change batch about to be submitted
pub fn report_change_batch(batch: &ChangeBatch) {
    info!(target: AUDIT_TARGET, payload = %render(batch), "change_batch");
}

/// Record the final result of an invocation
pub fn report(event: &LifecycleEvent, result: &ChangeResult) {
    info!(target: AUDIT_TARGET, payload = %result_payload(event, result), "result");
}

/// Record a failed invocation
pub fn report_failure(event: &LifecycleEvent, err: &Error) {
    error!(target: AUDIT_TARGET, payload = %failure_payload(event, err), "failure");
}

/// Record input that was refused before it became an event
pub fn report_rejected_payload(raw: &str, err: &Error) {
    error!(target: AUDIT_TARGET, payload = %rejected_payload(raw, err), "rejected");
}

fn render_record<T: Serialize>(record: &T) -> String {
    serde_json::to_string(record).unwrap_or_else(|e| format!("<unrenderable audit record: {}>", e))
}
