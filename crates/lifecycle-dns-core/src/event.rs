//! Lifecycle events and the state → DNS action mapping
//!
//! An inbound event names an instance and the state it moved into. Only two
//! states carry a DNS action:
//!
//! | state      | action   |
//! |------------|----------|
//! | `running`  | `UPSERT` |
//! | `stopping` | `DELETE` |
//!
//! Any other state fails with [`Error::UnrecognizedState`] before any
//! collaborator is contacted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Fixed lookup table from lifecycle state to DNS action
const STATE_ACTIONS: &[(&str, DnsAction)] = &[
    ("running", DnsAction::Upsert),
    ("stopping", DnsAction::Delete),
];

/// DNS mutation derived from a lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsAction {
    /// Point the record at the instance's current address
    Upsert,
    /// Remove the record
    Delete,
}

impl DnsAction {
    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsAction::Upsert => "UPSERT",
            DnsAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for DnsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle event envelope as delivered by the trigger
///
/// Only `detail` drives behavior. The remaining envelope fields are kept so
/// the audit trail can reproduce the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LifecycleEvent {
    /// Event id assigned by the delivering bus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Emitting service, e.g. `aws.ec2`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Human readable event type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_type: Option<String>,

    /// Account the instance belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    /// Region the instance runs in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// When the state transition happened
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "crate::timestamp::serialize_option"
    )]
    pub time: Option<DateTime<Utc>>,

    /// Resource identifiers referenced by the event
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    /// Instance id and state
    pub detail: EventDetail,
}

/// The part of the event that names the instance and its new state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EventDetail {
    /// Opaque instance identifier
    #[serde(default)]
    pub instance_id: String,

    /// Lifecycle state the instance moved into
    #[serde(default)]
    pub state: String,
}

impl LifecycleEvent {
    /// Build a bare event from an instance id and state
    pub fn new(instance_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: None,
            source: None,
            detail_type: None,
            account: None,
            region: None,
            time: None,
            resources: Vec::new(),
            detail: EventDetail {
                instance_id: instance_id.into(),
                state: state.into(),
            },
        }
    }

    /// Parse and validate an event payload
    pub fn from_json(payload: &str) -> Result<Self> {
        let event: LifecycleEvent = serde_json::from_str(payload)
            .map_err(|e| Error::invalid_event(format!("Malformed event payload: {}", e)))?;
        event.validate()?;
        Ok(event)
    }

    /// Check that the required detail fields are present
    pub fn validate(&self) -> Result<()> {
        if self.detail.instance_id.trim().is_empty() {
            return Err(Error::invalid_event("detail.instance-id is required"));
        }
        if self.detail.state.trim().is_empty() {
            return Err(Error::invalid_event("detail.state is required"));
        }
        Ok(())
    }

    /// Instance the event refers to
    pub fn instance_id(&self) -> &str {
        &self.detail.instance_id
    }

    /// Lifecycle state carried by the event
    pub fn state(&self) -> &str {
        &self.detail.state
    }
}

/// Look up the DNS action for a lifecycle state
pub fn action_for_state(state: &str) -> Result<DnsAction> {
    STATE_ACTIONS
        .iter()
        .find(|(name, _)| *name == state)
        .map(|(_, action)| *action)
        .ok_or_else(|| Error::unrecognized_state(state))
}

/// Derive the DNS action an event calls for
pub fn interpret(event: &LifecycleEvent) -> Result<DnsAction> {
    action_for_state(event.state())
}
