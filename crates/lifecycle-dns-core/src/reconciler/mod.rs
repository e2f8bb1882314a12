//! Record reconciliation
//!
//! Three strictly ordered steps against the zone service:
//!
//! 1. **Lookup**: fetch the placeholder `A` record for the host name,
//!    selecting by routing identifier when one is set
//! 2. **Mutate**: swap the first address for the instance's address
//!    (upsert only; a delete carries the record exactly as fetched)
//! 3. **Submit**: send a single-change batch and hand back the response
//!
//! Records are never created from scratch. A placeholder must exist in the
//! zone for every host name that may be upserted.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::event::DnsAction;
use crate::reporter;
use crate::resolver::InstanceSnapshot;
use crate::traits::{
    ChangeBatch, ChangeResponse, RECORD_TYPE_A, RecordQuery, RecordSet, ResourceRecord,
    ZoneService,
};

/// Comment attached to every submitted change batch
pub const CHANGE_COMMENT: &str = "updated by lifecycle-dns";

/// Outcome of one reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeResult {
    /// Zone the change was submitted to
    pub zone_id: String,
    /// Host name that was reconciled
    pub host_name: String,
    /// Action applied
    pub action: DnsAction,
    /// Batch as submitted
    pub change_batch: ChangeBatch,
    /// Zone service handle for the change
    pub response: ChangeResponse,
}

/// Whether a looked-up record set is the one `host_name` refers to
///
/// Lookups start at a name and may return the next record set in the zone,
/// so the name, the type and (when given) the routing identifier are checked.
/// Names compare case-insensitively with the trailing dot ignored; an
/// unqualified host name matches on the first label.
pub fn record_matches(record: &RecordSet, host_name: &str, identifier: Option<&str>) -> bool {
    let record_name = normalize_name(&record.name);
    let wanted = normalize_name(host_name);

    let name_matches = record_name == wanted
        || (!wanted.contains('.') && record_name.split('.').next() == Some(wanted.as_str()));

    let type_matches = record.record_type.eq_ignore_ascii_case(RECORD_TYPE_A);

    let identifier_matches = match identifier {
        Some(id) => record
            .routing_identifier
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case(id)),
        None => true,
    };

    name_matches && type_matches && identifier_matches
}

fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_lowercase()
}

/// Apply an action to a fetched record set
///
/// Upsert replaces the first address (or inserts it when the record set has
/// none). Delete leaves the record set untouched so the zone service sees it
/// exactly as it was read.
pub fn apply_action(
    mut record: RecordSet,
    action: DnsAction,
    new_address: Option<&str>,
) -> Result<RecordSet> {
    match action {
        DnsAction::Upsert => {
            let address = new_address.ok_or_else(|| Error::address_unavailable(&record.name))?;
            match record.resource_records.first_mut() {
                Some(first) => first.value = address.to_string(),
                None => record.resource_records.push(ResourceRecord::new(address)),
            }
            Ok(record)
        }
        DnsAction::Delete => Ok(record),
    }
}

/// Build the single-change batch for an action
pub fn build_change_batch(
    record: RecordSet,
    action: DnsAction,
    new_address: Option<&str>,
) -> Result<ChangeBatch> {
    let record = apply_action(record, action, new_address)?;
    Ok(ChangeBatch::single(CHANGE_COMMENT, action, record))
}

/// Reconciles host names against one zone
pub struct RecordReconciler {
    /// Zone service for lookups and mutations
    zone_service: Box<dyn ZoneService>,

    /// Zone the records live in
    zone_id: String,
}

impl RecordReconciler {
    /// Create a reconciler for a zone
    pub fn new(zone_service: Box<dyn ZoneService>, zone_id: impl Into<String>) -> Self {
        Self {
            zone_service,
            zone_id: zone_id.into(),
        }
    }

    /// Zone this reconciler works on
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    /// Fetch the placeholder record set for a host name
    ///
    /// # Errors
    ///
    /// - [`Error::RecordNotFound`]: the zone holds no matching record set
    /// - [`Error::ZoneService`]: the lookup itself failed
    pub async fn find_placeholder(
        &self,
        host_name: &str,
        identifier: Option<&str>,
    ) -> Result<RecordSet> {
        let query = RecordQuery::a_record(&self.zone_id, host_name, identifier);
        debug!("Looking up record set: {:?}", query);

        let record = self
            .zone_service
            .find_record(&query)
            .await
            .map_err(|e| self.zone_error(e))?
            .ok_or_else(|| Error::record_not_found(describe(host_name, identifier)))?;

        if !record_matches(&record, host_name, identifier) {
            warn!(
                "Zone returned {} ({}, identifier {:?}) for {}; no placeholder exists",
                record.name,
                record.record_type,
                record.routing_identifier,
                describe(host_name, identifier)
            );
            return Err(Error::record_not_found(describe(host_name, identifier)));
        }

        Ok(record)
    }

    /// Reconcile one host name
    ///
    /// Lookup, mutate and submit run strictly in sequence; nothing is
    /// retried. Zone service failures surface as [`Error::ZoneService`].
    pub async fn reconcile(
        &self,
        host_name: &str,
        identifier: Option<&str>,
        action: DnsAction,
        new_address: Option<&str>,
    ) -> Result<ChangeResult> {
        let record = self.find_placeholder(host_name, identifier).await?;

        if action == DnsAction::Upsert && record.first_value() == new_address {
            debug!("Record {} already points at {:?}", record.name, new_address);
        }

        let batch = build_change_batch(record, action, new_address)?;
        reporter::report_change_batch(&batch);

        let response = self
            .zone_service
            .submit_change(&self.zone_id, &batch)
            .await
            .map_err(|e| self.zone_error(e))?;

        info!(
            "{} {} accepted by {} (change {}, {:?})",
            action,
            host_name,
            self.zone_service.provider_name(),
            response.id,
            response.status
        );

        Ok(ChangeResult {
            zone_id: self.zone_id.clone(),
            host_name: host_name.to_string(),
            action,
            change_batch: batch,
            response,
        })
    }

    /// Reconcile the host name of a resolved snapshot
    pub async fn reconcile_snapshot(
        &self,
        snapshot: &InstanceSnapshot,
        action: DnsAction,
    ) -> Result<ChangeResult> {
        self.reconcile(
            &snapshot.host_name,
            snapshot.identifier.as_deref(),
            action,
            snapshot.public_address.as_deref(),
        )
        .await
    }

    fn zone_error(&self, err: Error) -> Error {
        match err {
            Error::ZoneService { .. } | Error::RecordNotFound(_) => err,
            other => Error::zone_service(self.zone_service.provider_name(), other.to_string()),
        }
    }
}

fn describe(host_name: &str, identifier: Option<&str>) -> String {
    match identifier {
        Some(id) => format!("{} {} (identifier {})", host_name, RECORD_TYPE_A, id),
        None => format!("{} {}", host_name, RECORD_TYPE_A),
    }
}
