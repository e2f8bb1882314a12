//! Test doubles and common utilities for contract tests
//!
//! The doubles count every collaborator call so tests can assert both what
//! was sent and that nothing was sent at all.

#![allow(dead_code)]

use chrono::Utc;
use lifecycle_dns_core::config::ZoneConfig;
use lifecycle_dns_core::error::{Error, Result};
use lifecycle_dns_core::event::DnsAction;
use lifecycle_dns_core::traits::{
    ChangeBatch, ChangeResponse, ChangeStatus, InstanceDescription, InstanceDirectory,
    RecordQuery, RecordSet, Tag, ZoneService,
};
use lifecycle_dns_core::LifecycleEngine;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE_ID: &str = "Z0EXAMPLE";
pub const DOMAIN: &str = "example.com";
pub const INSTANCE_ID: &str = "i-abc";
pub const NEW_ADDRESS: &str = "203.0.113.9";
pub const OLD_ADDRESS: &str = "203.0.113.1";

/// Tags of the canonical test instance
pub fn web1_tags() -> Vec<Tag> {
    vec![Tag::new("hostname", "web1"), Tag::new("identifier", "blue")]
}

/// The placeholder record the zone holds for the canonical instance
pub fn web1_placeholder() -> RecordSet {
    RecordSet::a_record("web1.example.com.", OLD_ADDRESS)
        .with_routing_identifier("blue")
        .with_ttl(60)
}

/// An instance directory that counts lookups
pub struct StubInstanceDirectory {
    instances: Arc<HashMap<String, InstanceDescription>>,
    describe_call_count: Arc<AtomicUsize>,
    failure: Option<String>,
}

impl StubInstanceDirectory {
    /// A directory with no instances
    pub fn empty() -> Self {
        Self {
            instances: Arc::new(HashMap::new()),
            describe_call_count: Arc::new(AtomicUsize::new(0)),
            failure: None,
        }
    }

    /// A directory holding one instance
    pub fn with_instance(
        instance_id: &str,
        public_address: Option<&str>,
        tags: Vec<Tag>,
    ) -> Self {
        let mut instances = HashMap::new();
        instances.insert(
            instance_id.to_string(),
            InstanceDescription::new(public_address, tags),
        );
        Self {
            instances: Arc::new(instances),
            describe_call_count: Arc::new(AtomicUsize::new(0)),
            failure: None,
        }
    }

    /// A directory whose every lookup fails
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::empty()
        }
    }

    /// Get the number of times describe_instance() was called
    pub fn describe_call_count(&self) -> usize {
        self.describe_call_count.load(Ordering::SeqCst)
    }

    /// Create a new stub that shares counters and contents with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            instances: Arc::clone(&other.instances),
            describe_call_count: Arc::clone(&other.describe_call_count),
            failure: other.failure.clone(),
        }
    }
}

#[async_trait::async_trait]
impl InstanceDirectory for StubInstanceDirectory {
    async fn describe_instance(&self, instance_id: &str) -> Result<Option<InstanceDescription>> {
        self.describe_call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(Error::instance_directory(message.clone()));
        }
        Ok(self.instances.get(instance_id).cloned())
    }

    fn directory_name(&self) -> &'static str {
        "stub"
    }
}

/// A zone service that records queries and batches
///
/// Holds one live record set. Accepted upserts overwrite it and accepted
/// deletes clear it, so repeated submissions behave the way an idempotent
/// zone does.
pub struct RecordingZoneService {
    live: Arc<Mutex<Option<RecordSet>>>,
    queries: Arc<Mutex<Vec<RecordQuery>>>,
    submitted: Arc<Mutex<Vec<(String, ChangeBatch)>>>,
    find_call_count: Arc<AtomicUsize>,
    submit_call_count: Arc<AtomicUsize>,
    lookup_failure: Option<String>,
    submit_failure: Option<String>,
}

impl RecordingZoneService {
    /// A zone holding `record`, or nothing
    pub fn new(record: Option<RecordSet>) -> Self {
        Self {
            live: Arc::new(Mutex::new(record)),
            queries: Arc::new(Mutex::new(Vec::new())),
            submitted: Arc::new(Mutex::new(Vec::new())),
            find_call_count: Arc::new(AtomicUsize::new(0)),
            submit_call_count: Arc::new(AtomicUsize::new(0)),
            lookup_failure: None,
            submit_failure: None,
        }
    }

    /// Make every lookup fail with a plain (non zone service) error
    pub fn with_lookup_failure(mut self, message: &str) -> Self {
        self.lookup_failure = Some(message.to_string());
        self
    }

    /// Make every submission fail with a zone service error
    pub fn with_submit_failure(mut self, message: &str) -> Self {
        self.submit_failure = Some(message.to_string());
        self
    }

    /// Get the number of times find_record() was called
    pub fn find_call_count(&self) -> usize {
        self.find_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times submit_change() was called
    pub fn submit_call_count(&self) -> usize {
        self.submit_call_count.load(Ordering::SeqCst)
    }

    /// Queries received so far
    pub fn queries(&self) -> Vec<RecordQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Batches received so far, with their zone id
    pub fn submitted(&self) -> Vec<(String, ChangeBatch)> {
        self.submitted.lock().unwrap().clone()
    }

    /// The record set the zone currently holds
    pub fn live_record(&self) -> Option<RecordSet> {
        self.live.lock().unwrap().clone()
    }

    /// Create a new zone that shares counters and contents with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            live: Arc::clone(&other.live),
            queries: Arc::clone(&other.queries),
            submitted: Arc::clone(&other.submitted),
            find_call_count: Arc::clone(&other.find_call_count),
            submit_call_count: Arc::clone(&other.submit_call_count),
            lookup_failure: other.lookup_failure.clone(),
            submit_failure: other.submit_failure.clone(),
        }
    }
}

#[async_trait::async_trait]
impl ZoneService for RecordingZoneService {
    async fn find_record(&self, query: &RecordQuery) -> Result<Option<RecordSet>> {
        self.find_call_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if let Some(message) = &self.lookup_failure {
            return Err(Error::Other(message.clone()));
        }
        Ok(self.live.lock().unwrap().clone())
    }

    async fn submit_change(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeResponse> {
        let call = self.submit_call_count.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap()
            .push((zone_id.to_string(), batch.clone()));

        if let Some(message) = &self.submit_failure {
            return Err(Error::zone_service(self.provider_name(), message.clone()));
        }

        let mut live = self.live.lock().unwrap();
        for change in &batch.changes {
            match change.action {
                DnsAction::Upsert => *live = Some(change.record_set.clone()),
                DnsAction::Delete => *live = None,
            }
        }

        Ok(ChangeResponse {
            id: format!("C{:04}", call + 1),
            status: ChangeStatus::Insync,
            submitted_at: Utc::now(),
            comment: Some(batch.comment.clone()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Zone config used across the contract tests
pub fn test_zone(domain_suffix: Option<&str>) -> ZoneConfig {
    ZoneConfig::new(ZONE_ID, domain_suffix)
}

/// Build an engine over the given doubles, keeping the test's handles live
pub fn engine_over(
    directory: &StubInstanceDirectory,
    zone: &RecordingZoneService,
    domain_suffix: Option<&str>,
) -> LifecycleEngine {
    LifecycleEngine::new(
        Box::new(StubInstanceDirectory::sharing_counters_with(directory)),
        Box::new(RecordingZoneService::sharing_counters_with(zone)),
        test_zone(domain_suffix),
    )
    .expect("engine construction succeeds")
}
