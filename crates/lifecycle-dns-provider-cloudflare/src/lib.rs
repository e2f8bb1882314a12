// # Cloudflare Zone Service
//
// ZoneService implementation backed by the Cloudflare API v4.
//
// ## Mapping
//
// - Record lookup lists `dns_records` filtered by exact name and type. A
//   bare host name (no dot) is looked up by name prefix instead.
// - The routing identifier is kept in the record's `comment` field. When one
//   is given, a page of same-named records is fetched and the comment is
//   compared case-insensitively here, since the API's comment filters are
//   exact.
// - An upsert overwrites the looked-up record by id (PUT), writing back
//   every field it read apart from the address.
// - A delete removes the looked-up record by id (DELETE).
//
// Cloudflare applies one record per request, so a batch is submitted change
// by change. Batches built by the reconciler always hold exactly one change.
//
// ## Behaviour
//
// - One HTTP request per call, no retries, no caching
// - Dry-run mode performs lookups but logs mutations instead of sending them
// - 30 second HTTP timeout
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Construction fails if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Overwrite DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use chrono::Utc;
use lifecycle_dns_core::config::ZoneServiceConfig;
use lifecycle_dns_core::event::DnsAction;
use lifecycle_dns_core::traits::{
    Change, ChangeBatch, ChangeResponse, ChangeStatus, RecordQuery, RecordSet, ResourceRecord,
    ZoneService, ZoneServiceFactory,
};
use lifecycle_dns_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Smallest page size the record listing accepts
const MIN_PER_PAGE: u32 = 5;

/// Page size when records are picked by routing identifier
const IDENTIFIER_SCAN_PAGE: u32 = 100;

/// Zone service name used in errors and logs
const PROVIDER_NAME: &str = "cloudflare";

/// Change id reported for batches that were only logged
pub const DRY_RUN_CHANGE_ID: &str = "dry-run";

/// Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// A DNS record as Cloudflare returns it
#[derive(Debug, Clone, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default)]
    ttl: Option<u32>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    proxied: Option<bool>,
}

impl DnsRecord {
    /// Whether the record carries the routing identifier
    fn has_identifier(&self, identifier: &str) -> bool {
        self.comment
            .as_deref()
            .is_some_and(|c| c.trim().eq_ignore_ascii_case(identifier))
    }

    /// Convert to a zone-neutral record set
    ///
    /// Names come back without the trailing dot; the record set carries the
    /// fully qualified form. The record id travels as the provider handle.
    fn into_record_set(self) -> RecordSet {
        RecordSet {
            name: qualify(&self.name),
            record_type: self.record_type,
            routing_identifier: self.comment.filter(|c| !c.is_empty()),
            ttl: self.ttl,
            resource_records: vec![ResourceRecord::new(self.content)],
            proxied: self.proxied,
            provider_ref: Some(self.id),
        }
    }
}

/// Body of an overwrite request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct RecordPayload {
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxied: Option<bool>,
}

impl RecordPayload {
    /// Build the overwrite body for a record set
    ///
    /// The routing identifier is written back as the comment so the next
    /// lookup still finds the record.
    fn from_record_set(record: &RecordSet) -> Result<Self> {
        let content = record.first_value().ok_or_else(|| {
            Error::zone_service(
                PROVIDER_NAME,
                format!("Record set {} has no value to write", record.name),
            )
        })?;

        Ok(Self {
            record_type: record.record_type.clone(),
            name: unqualify(&record.name).to_string(),
            content: content.to_string(),
            ttl: record.ttl,
            comment: record.routing_identifier.clone(),
            proxied: record.proxied,
        })
    }
}

/// Query parameters for a record lookup
///
/// The `name` filter only matches full names, so an unqualified host name
/// is sent as a prefix of the first label.
fn lookup_params(query: &RecordQuery) -> Vec<(&'static str, String)> {
    let name = unqualify(&query.name);
    let name_filter = if name.contains('.') {
        ("name", name.to_string())
    } else {
        ("name.startswith", format!("{}.", name.to_lowercase()))
    };

    let per_page = match query.identifier {
        Some(_) => IDENTIFIER_SCAN_PAGE,
        None => query.limit.max(MIN_PER_PAGE),
    };

    vec![
        name_filter,
        ("type", query.record_type.clone()),
        ("per_page", per_page.to_string()),
    ]
}

/// Pick the record a query points at from one listing page
fn select_record(records: Vec<DnsRecord>, query: &RecordQuery) -> Option<DnsRecord> {
    records.into_iter().find(|record| match query.identifier.as_deref() {
        Some(identifier) => record.has_identifier(identifier),
        None => true,
    })
}

fn unqualify(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

fn qualify(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Map a non-success HTTP status to a zone service error
fn status_error(status: u16, operation: &str, body: &str) -> Error {
    let message = match status {
        401 | 403 => format!(
            "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("{} failed: zone or record not found. Status: {}", operation, status),
        409 => format!(
            "Conflict: Record is being updated by another process. Status: {}",
            status
        ),
        429 => format!("Rate limit exceeded. Status: {}", status),
        500..=599 => format!("Cloudflare server error: {} - {}", status, body),
        _ => format!("{} failed: {} - {}", operation, status, body),
    };
    Error::zone_service(PROVIDER_NAME, message)
}

fn envelope_error(operation: &str, errors: &[ApiMessage]) -> Error {
    let detail = if errors.is_empty() {
        "no error detail".to_string()
    } else {
        errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    };
    Error::zone_service(PROVIDER_NAME, format!("{} rejected: {}", operation, detail))
}

/// Cloudflare zone service
///
/// Stateless and single-shot: every call is one HTTP round trip and nothing
/// is remembered between calls.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, lookups go to the API as usual but submissions
/// only log the request they would have sent and report a `PENDING` change
/// with id [`DRY_RUN_CHANGE_ID`].
pub struct CloudflareZoneService {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform lookups but skip mutations
    dry_run: bool,

    /// API base URL
    api_base: String,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareZoneService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareZoneService")
            .field("api_token", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareZoneService {
    /// Create a new Cloudflare zone service
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, perform lookups but skip mutations
    ///
    /// # Errors
    ///
    /// - [`Error::Config`]: the token is empty or the HTTP client cannot be built
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            client,
            dry_run,
            api_base: CLOUDFLARE_API_BASE.to_string(),
        })
    }

    /// Point the service at a different API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether mutations are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.api_base, zone_id, record_id)
    }

    /// Send a request and unwrap the Cloudflare envelope
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<Option<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                Error::zone_service(PROVIDER_NAME, format!("HTTP request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status.as_u16(), operation, &body));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::zone_service(PROVIDER_NAME, format!("Failed to parse response: {}", e))
        })?;

        if !envelope.success {
            return Err(envelope_error(operation, &envelope.errors));
        }
        Ok(envelope.result)
    }

    /// Apply one change and return the record id it touched
    async fn apply(&self, zone_id: &str, change: &Change) -> Result<String> {
        let record = &change.record_set;
        let record_id = record.provider_ref.as_deref().ok_or_else(|| {
            Error::zone_service(
                PROVIDER_NAME,
                format!("Record set {} carries no Cloudflare record id", record.name),
            )
        })?;
        let url = self.record_url(zone_id, record_id);

        match change.action {
            DnsAction::Upsert => {
                let payload = RecordPayload::from_record_set(record)?;
                if self.dry_run {
                    tracing::info!(
                        "[DRY-RUN] Would send PUT request to {} with payload: {}",
                        url,
                        serde_json::to_string(&payload)?
                    );
                    return Ok(record_id.to_string());
                }
                let _: Option<DnsRecord> = self
                    .send(self.client.put(&url).json(&payload), "Record update")
                    .await?;
            }
            DnsAction::Delete => {
                if self.dry_run {
                    tracing::info!("[DRY-RUN] Would send DELETE request to {}", url);
                    return Ok(record_id.to_string());
                }
                let _: Option<serde_json::Value> =
                    self.send(self.client.delete(&url), "Record delete").await?;
            }
        }

        tracing::info!("{} {} applied (record {})", change.action, record.name, record_id);
        Ok(record_id.to_string())
    }
}

#[async_trait]
impl ZoneService for CloudflareZoneService {
    async fn find_record(&self, query: &RecordQuery) -> Result<Option<RecordSet>> {
        tracing::debug!(
            "Looking up Cloudflare record: {} (type: {}, identifier: {:?})",
            query.name,
            query.record_type,
            query.identifier
        );

        let request = self
            .client
            .get(self.records_url(&query.zone_id))
            .query(&lookup_params(query));

        let records: Vec<DnsRecord> = self
            .send(request, "Record lookup")
            .await?
            .unwrap_or_default();

        let found = select_record(records, query).map(DnsRecord::into_record_set);
        if let Some(record) = &found {
            tracing::debug!(
                "Found record {} -> {:?}",
                record.name,
                record.first_value()
            );
        }
        Ok(found)
    }

    async fn submit_change(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeResponse> {
        tracing::info!(
            "Submitting {} change(s) to zone {} ({}) [mode: {}]",
            batch.changes.len(),
            zone_id,
            batch.comment,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        let mut last_id = None;
        for change in &batch.changes {
            last_id = Some(self.apply(zone_id, change).await?);
        }

        let (id, status) = if self.dry_run {
            (DRY_RUN_CHANGE_ID.to_string(), ChangeStatus::Pending)
        } else {
            let id = last_id
                .ok_or_else(|| Error::zone_service(PROVIDER_NAME, "Change batch is empty"))?;
            (id, ChangeStatus::Insync)
        };

        Ok(ChangeResponse {
            id,
            status,
            submitted_at: Utc::now(),
            comment: Some(batch.comment.clone()),
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Cloudflare zone services
pub struct CloudflareFactory;

impl ZoneServiceFactory for CloudflareFactory {
    fn create(&self, config: &ZoneServiceConfig) -> Result<Box<dyn ZoneService>> {
        match config {
            ZoneServiceConfig::Cloudflare { api_token, dry_run } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token is required"));
                }

                if *dry_run {
                    tracing::warn!(
                        "Cloudflare zone service running in DRY-RUN mode - no changes will be made"
                    );
                }

                Ok(Box::new(CloudflareZoneService::new(api_token.clone(), *dry_run)?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare zone service")),
        }
    }
}

/// Register the Cloudflare zone service with a registry
///
/// # Example
///
/// ```rust
/// use lifecycle_dns_core::ServiceRegistry;
///
/// let registry = ServiceRegistry::new();
/// lifecycle_dns_provider_cloudflare::register(&registry);
/// assert!(registry.has_zone_service("cloudflare"));
/// ```
pub fn register(registry: &lifecycle_dns_core::ServiceRegistry) {
    registry.register_zone_service(PROVIDER_NAME, Box::new(CloudflareFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder() -> RecordSet {
        RecordSet::a_record("web1.example.com.", "203.0.113.9")
            .with_routing_identifier("blue")
            .with_ttl(60)
            .with_provider_ref("372e67954025e0ba6aaa6d586b9e0b59")
    }

    #[test]
    fn test_factory_creation() {
        let factory = CloudflareFactory;

        let config = ZoneServiceConfig::Cloudflare {
            api_token: "test_token".to_string(),
            dry_run: false,
        };
        let service = factory.create(&config).unwrap();
        assert_eq!(service.provider_name(), "cloudflare");
    }

    #[test]
    fn test_factory_missing_token() {
        let factory = CloudflareFactory;

        let config = ZoneServiceConfig::Cloudflare {
            api_token: String::new(),
            dry_run: false,
        };
        assert!(factory.create(&config).is_err());

        let custom = ZoneServiceConfig::Custom {
            factory: "route53".to_string(),
            config: serde_json::json!({}),
        };
        assert!(factory.create(&custom).is_err());
    }

    #[test]
    fn test_empty_token_is_config_error() {
        let err = CloudflareZoneService::new("", false).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let service = CloudflareZoneService::new("secret_token_12345", true).unwrap();

        let debug_str = format!("{:?}", service);
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("CloudflareZoneService"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    fn listed(name: &str, comment: Option<&str>) -> DnsRecord {
        DnsRecord {
            id: format!("id-{}", comment.unwrap_or("none")),
            name: name.to_string(),
            record_type: "A".to_string(),
            content: "203.0.113.1".to_string(),
            ttl: Some(60),
            comment: comment.map(str::to_string),
            proxied: None,
        }
    }

    #[test]
    fn test_lookup_params() {
        let query = RecordQuery::a_record("Z1", "web1.example.com.", None);
        assert_eq!(
            lookup_params(&query),
            vec![
                ("name", "web1.example.com".to_string()),
                ("type", "A".to_string()),
                ("per_page", "5".to_string()),
            ]
        );

        // Identifier is matched locally over a wider page
        let tagged = RecordQuery::a_record("Z1", "web1.example.com.", Some("blue"));
        let params = lookup_params(&tagged);
        assert!(params.contains(&("per_page", "100".to_string())));
        assert!(params.iter().all(|(k, _)| !k.starts_with("comment")));
    }

    #[test]
    fn test_bare_host_name_is_looked_up_by_prefix() {
        let query = RecordQuery::a_record("Z1", "web1", None);
        assert_eq!(
            lookup_params(&query),
            vec![
                ("name.startswith", "web1.".to_string()),
                ("type", "A".to_string()),
                ("per_page", "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_identifier_selection_ignores_case() {
        let records = vec![
            listed("web1.example.com", Some("Green")),
            listed("web1.example.com", Some("Blue")),
        ];

        let query = RecordQuery::a_record("Z1", "web1.example.com.", Some("blue"));
        let found = select_record(records.clone(), &query).unwrap();
        assert_eq!(found.comment.as_deref(), Some("Blue"));

        let missing = RecordQuery::a_record("Z1", "web1.example.com.", Some("red"));
        assert!(select_record(records.clone(), &missing).is_none());

        let untagged = RecordQuery::a_record("Z1", "web1.example.com.", None);
        assert_eq!(
            select_record(records, &untagged).unwrap().comment.as_deref(),
            Some("Green")
        );
    }

    #[test]
    fn test_record_conversion() {
        let json = r#"{
            "success": true,
            "errors": [],
            "result": [{
                "id": "372e67954025e0ba6aaa6d586b9e0b59",
                "name": "web1.example.com",
                "type": "A",
                "content": "203.0.113.1",
                "ttl": 60,
                "comment": "blue",
                "proxied": true
            }]
        }"#;

        let envelope: Envelope<Vec<DnsRecord>> = serde_json::from_str(json).unwrap();
        assert!(envelope.success);

        let record = envelope.result.unwrap().remove(0).into_record_set();
        assert_eq!(record.name, "web1.example.com.");
        assert_eq!(record.record_type, "A");
        assert_eq!(record.first_value(), Some("203.0.113.1"));
        assert_eq!(record.routing_identifier.as_deref(), Some("blue"));
        assert_eq!(record.ttl, Some(60));
        assert_eq!(record.proxied, Some(true));
        assert_eq!(
            record.provider_ref.as_deref(),
            Some("372e67954025e0ba6aaa6d586b9e0b59")
        );
    }

    #[test]
    fn test_payload_keeps_identifier_and_ttl() {
        let payload = RecordPayload::from_record_set(&placeholder()).unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "type": "A",
                "name": "web1.example.com",
                "content": "203.0.113.9",
                "ttl": 60,
                "comment": "blue"
            })
        );

        let mut empty = placeholder();
        empty.resource_records.clear();
        assert!(RecordPayload::from_record_set(&empty).is_err());
    }

    #[test]
    fn test_upsert_payload_keeps_proxied_flag() {
        let fetched = DnsRecord {
            proxied: Some(true),
            ttl: Some(1),
            ..listed("web1.example.com", Some("blue"))
        }
        .into_record_set();

        let mut updated = fetched.clone();
        updated.resource_records[0] = ResourceRecord::new("203.0.113.9");

        let body = serde_json::to_value(RecordPayload::from_record_set(&updated).unwrap()).unwrap();
        assert_eq!(body["proxied"], true);
        assert_eq!(body["content"], "203.0.113.9");
        assert_eq!(body["ttl"], 1);
        assert_eq!(body["comment"], "blue");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (401, "Authentication failed"),
            (403, "Authentication failed"),
            (404, "not found"),
            (409, "Conflict"),
            (429, "Rate limit"),
            (502, "server error"),
            (400, "Record update failed"),
        ];

        for (status, expected) in cases {
            match status_error(status, "Record update", "bad request") {
                Error::ZoneService { provider, message } => {
                    assert_eq!(provider, "cloudflare");
                    assert!(message.contains(expected), "{}: {}", status, message);
                }
                other => panic!("expected ZoneService, got {}", other),
            }
        }
    }

    #[test]
    fn test_rejected_envelope_lists_errors() {
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(
            r#"{"success": false, "errors": [{"code": 81044, "message": "Record does not exist."}], "result": null}"#,
        )
        .unwrap();

        let err = envelope_error("Record update", &envelope.errors);
        assert!(err.to_string().contains("81044: Record does not exist."));
    }

    #[tokio::test]
    async fn test_dry_run_submit_sends_nothing() {
        // Unroutable base: any real request would fail
        let service = CloudflareZoneService::new("token", true)
            .unwrap()
            .with_api_base("http://127.0.0.1:9");

        let batch = ChangeBatch::single("updated by lifecycle-dns", DnsAction::Upsert, placeholder());
        let response = service.submit_change("Z1", &batch).await.unwrap();

        assert_eq!(response.id, DRY_RUN_CHANGE_ID);
        assert_eq!(response.status, ChangeStatus::Pending);
        assert_eq!(response.comment.as_deref(), Some("updated by lifecycle-dns"));
    }

    #[tokio::test]
    async fn test_change_without_record_id_is_rejected() {
        let service = CloudflareZoneService::new("token", true).unwrap();

        let mut record = placeholder();
        record.provider_ref = None;
        let batch = ChangeBatch::single("updated by lifecycle-dns", DnsAction::Delete, record);

        let err = service.submit_change("Z1", &batch).await.unwrap_err();
        assert!(matches!(err, Error::ZoneService { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_zone_service_error() {
        let service = CloudflareZoneService::new("token", false)
            .unwrap()
            .with_api_base("http://127.0.0.1:9");

        let query = RecordQuery::a_record("Z1", "web1.example.com.", None);
        let err = service.find_record(&query).await.unwrap_err();
        assert!(matches!(err, Error::ZoneService { .. }), "got {}", err);
    }
}
