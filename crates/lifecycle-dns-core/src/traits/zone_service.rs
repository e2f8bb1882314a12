// # Zone Service Trait
//
// Defines the interface to the authoritative DNS zone holding the records
// this job keeps in step with instance lifecycles.
//
// ## Implementations
//
// - Cloudflare: `lifecycle-dns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use lifecycle_dns_core::traits::{RecordQuery, ZoneService};
//
// let query = RecordQuery::a_record("Z123", "web1.example.com.", Some("blue"));
// if let Some(record) = zone.find_record(&query).await? {
//     let response = zone.submit_change("Z123", &batch).await?;
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::DnsAction;

/// Record type every lookup and mutation in this crate targets
pub const RECORD_TYPE_A: &str = "A";

/// One value of a record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Address or other record content
    pub value: String,
}

impl ResourceRecord {
    /// Create a resource record holding `value`
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// A record set as held by the zone
///
/// Fetched fresh for each invocation and used as the template for the
/// change submitted back to the zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Fully qualified record name
    pub name: String,

    /// Record type, e.g. `A`
    #[serde(rename = "type")]
    pub record_type: String,

    /// Disambiguates record sets sharing a name and type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_identifier: Option<String>,

    /// Time-to-live in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// Ordered record values
    #[serde(default)]
    pub resource_records: Vec<ResourceRecord>,

    /// Whether the zone serves the record through its own proxy, for
    /// services that have one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,

    /// Provider-specific handle for the record (e.g. a record id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_ref: Option<String>,
}

impl RecordSet {
    /// Create an `A` record set with a single value
    pub fn a_record(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: RECORD_TYPE_A.to_string(),
            routing_identifier: None,
            ttl: None,
            resource_records: vec![ResourceRecord::new(address)],
            proxied: None,
            provider_ref: None,
        }
    }

    /// Set the routing identifier
    pub fn with_routing_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.routing_identifier = Some(identifier.into());
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the proxied flag
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = Some(proxied);
        self
    }

    /// Set the provider-specific handle
    pub fn with_provider_ref(mut self, provider_ref: impl Into<String>) -> Self {
        self.provider_ref = Some(provider_ref.into());
        self
    }

    /// First record value, if any
    pub fn first_value(&self) -> Option<&str> {
        self.resource_records.first().map(|r| r.value.as_str())
    }
}

/// Lookup of the record set a host name should resolve through
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordQuery {
    /// Zone to search
    pub zone_id: String,
    /// Name the listing starts at
    pub name: String,
    /// Record type the listing starts at
    pub record_type: String,
    /// Maximum number of record sets to return
    pub limit: u32,
    /// Routing identifier to select among same-named record sets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl RecordQuery {
    /// Query for a single `A` record set
    pub fn a_record(
        zone_id: impl Into<String>,
        name: impl Into<String>,
        identifier: Option<&str>,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            name: name.into(),
            record_type: RECORD_TYPE_A.to_string(),
            limit: 1,
            identifier: identifier.map(str::to_string),
        }
    }
}

/// One mutation inside a change batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// What to do with the record set
    pub action: DnsAction,
    /// The record set the action applies to
    pub record_set: RecordSet,
}

/// Atomic set of record mutations submitted to the zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    /// Human readable note stored with the change
    pub comment: String,
    /// Ordered mutations
    pub changes: Vec<Change>,
}

impl ChangeBatch {
    /// A batch carrying exactly one change
    pub fn single(comment: impl Into<String>, action: DnsAction, record_set: RecordSet) -> Self {
        Self {
            comment: comment.into(),
            changes: vec![Change { action, record_set }],
        }
    }
}

/// Propagation status of a submitted change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeStatus {
    /// Accepted, not yet propagated
    Pending,
    /// Applied on all authoritative servers
    Insync,
}

/// Handle the zone service returns for an accepted change batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeResponse {
    /// Change id assigned by the zone service
    pub id: String,
    /// Propagation status
    pub status: ChangeStatus,
    /// When the zone service accepted the change
    #[serde(serialize_with = "crate::timestamp::serialize")]
    pub submitted_at: DateTime<Utc>,
    /// Comment echoed back by the zone service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Trait for zone service implementations
///
/// Implementations are stateless and single-shot: one API round trip per
/// call, no retries, no caching between calls. Failures are returned as
/// [`crate::Error::ZoneService`] and end the invocation.
#[async_trait]
pub trait ZoneService: Send + Sync {
    /// Find the record set a query points at
    ///
    /// Returns `Ok(None)` when the zone holds no matching record set. The
    /// returned record set may be the next one after `query.name` in zone
    /// order; callers check the name.
    async fn find_record(&self, query: &RecordQuery) -> Result<Option<RecordSet>, crate::Error>;

    /// Apply a change batch to a zone
    ///
    /// The batch is applied atomically or not at all. Submitting a batch
    /// whose upsert already matches the live record is not an error.
    async fn submit_change(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeResponse, crate::Error>;

    /// Zone service name (for logging and error context)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing zone services from configuration
pub trait ZoneServiceFactory: Send + Sync {
    /// Create a ZoneService instance from configuration
    fn create(
        &self,
        config: &crate::config::ZoneServiceConfig,
    ) -> Result<Box<dyn ZoneService>, crate::Error>;
}
