//! Instance parameter resolution
//!
//! Turns an instance id into the facts reconciliation needs: the address to
//! publish, the host name to publish it under, and the routing identifier
//! that picks one record among several sharing that name.
//!
//! Tags are scanned once, in directory order. Keys compare
//! case-insensitively and a later tag overrides an earlier one with the same
//! key, so `[hostname=a, HostName=b]` resolves to `b`.

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::event::DnsAction;
use crate::traits::{InstanceDirectory, Tag};

/// Tag key naming the host an instance answers to
pub const HOSTNAME_TAG: &str = "hostname";

/// Tag key carrying the routing identifier
pub const IDENTIFIER_TAG: &str = "identifier";

/// Raw parameters read from instance tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagParams {
    /// Lower-cased `hostname` tag value
    pub host_name: Option<String>,
    /// Lower-cased `identifier` tag value
    pub identifier: Option<String>,
}

/// Read `hostname` and `identifier` from a tag sequence
///
/// Blank values count as absent, but still override earlier tags.
pub fn params_from_tags(tags: &[Tag]) -> TagParams {
    let scanned = tags.iter().fold(TagParams::default(), |mut params, tag| {
        let key = tag.key.to_lowercase();
        if key == HOSTNAME_TAG {
            params.host_name = Some(tag.value.trim().to_lowercase());
        } else if key == IDENTIFIER_TAG {
            params.identifier = Some(tag.value.trim().to_lowercase());
        }
        params
    });

    TagParams {
        host_name: scanned.host_name.filter(|v| !v.is_empty()),
        identifier: scanned.identifier.filter(|v| !v.is_empty()),
    }
}

/// Apply the domain suffix rule to a host name
///
/// With a suffix the result is DNS-absolute (`web1.example.com.`); without
/// one the host name is returned unchanged.
pub fn qualify_host_name(host_name: &str, domain_suffix: Option<&str>) -> String {
    match domain_suffix {
        Some(suffix) if !suffix.is_empty() => {
            format!("{}.{}.", host_name, suffix.to_lowercase())
        }
        _ => host_name.to_string(),
    }
}

/// Resolved facts about one instance, owned by one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSnapshot {
    /// Instance the snapshot describes
    pub instance_id: String,
    /// Current public address, if the instance has one
    pub public_address: Option<String>,
    /// Tags as returned by the directory
    pub tags: Vec<Tag>,
    /// Host name to publish under, never empty
    pub host_name: String,
    /// Routing identifier, if tagged
    pub identifier: Option<String>,
}

/// Resolves instance snapshots through an instance directory
pub struct InstanceResolver {
    /// Directory queried once per resolution
    directory: Box<dyn InstanceDirectory>,

    /// Domain appended to host names
    domain_suffix: Option<String>,
}

impl InstanceResolver {
    /// Create a resolver
    ///
    /// # Parameters
    ///
    /// - `directory`: Instance directory implementation
    /// - `domain_suffix`: Domain to qualify host names with, `None` to leave them as tagged
    pub fn new(directory: Box<dyn InstanceDirectory>, domain_suffix: Option<&str>) -> Self {
        Self {
            directory,
            domain_suffix: domain_suffix
                .map(|s| s.trim().trim_end_matches('.'))
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    /// Resolve the snapshot for an instance
    ///
    /// `action` decides whether a missing public address is fatal: an
    /// upsert needs one, a delete does not.
    ///
    /// # Errors
    ///
    /// - [`Error::InstanceNotFound`]: the directory has no such instance
    /// - [`Error::HostnameMissing`]: no non-blank `hostname` tag
    /// - [`Error::AddressUnavailable`]: upsert without a public address
    pub async fn resolve(&self, instance_id: &str, action: DnsAction) -> Result<InstanceSnapshot> {
        debug!(
            "Describing instance {} via {}",
            instance_id,
            self.directory.directory_name()
        );

        let description = self
            .directory
            .describe_instance(instance_id)
            .await?
            .ok_or_else(|| Error::instance_not_found(instance_id))?;

        let params = params_from_tags(&description.tags);

        let host_name = params
            .host_name
            .map(|name| qualify_host_name(&name, self.domain_suffix.as_deref()))
            .ok_or_else(|| Error::hostname_missing(instance_id))?;

        let public_address = description
            .public_address
            .map(|addr| addr.trim().to_string())
            .filter(|addr| !addr.is_empty());

        if action == DnsAction::Upsert && public_address.is_none() {
            return Err(Error::address_unavailable(instance_id));
        }

        debug!(
            "Resolved {}: host {} identifier {:?} address {:?}",
            instance_id, host_name, params.identifier, public_address
        );

        Ok(InstanceSnapshot {
            instance_id: instance_id.to_string(),
            public_address,
            tags: description.tags,
            host_name,
            identifier: params.identifier,
        })
    }
}
