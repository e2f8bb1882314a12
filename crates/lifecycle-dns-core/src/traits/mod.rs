//! Collaborator traits for lifecycle DNS reconciliation
//!
//! - [`InstanceDirectory`]: Look up an instance's address and tags
//! - [`ZoneService`]: Read and mutate record sets in a DNS zone

pub mod instance_directory;
pub mod zone_service;

pub use instance_directory::{InstanceDescription, InstanceDirectory, InstanceDirectoryFactory, Tag};
pub use zone_service::{
    Change, ChangeBatch, ChangeResponse, ChangeStatus, RECORD_TYPE_A, RecordQuery, RecordSet,
    ResourceRecord, ZoneService, ZoneServiceFactory,
};
