//! Configuration types for lifecycle DNS reconciliation
//!
//! Values are read once per invocation and consumed as plain strings.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleDnsConfig {
    /// Zone the records live in
    pub zone: ZoneConfig,

    /// Zone service configuration
    pub zone_service: ZoneServiceConfig,

    /// Instance directory configuration
    pub instance_directory: InstanceDirectoryConfig,
}

impl LifecycleDnsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.zone.validate()?;
        self.zone_service.validate()?;
        self.instance_directory.validate()?;
        Ok(())
    }
}

/// Zone addressing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone identifier understood by the zone service
    pub zone_id: String,

    /// Domain appended to host names; `None` leaves host names unqualified
    #[serde(default)]
    pub domain_suffix: Option<String>,
}

impl ZoneConfig {
    /// Create a zone configuration, normalising the domain suffix
    ///
    /// An empty suffix means "do not qualify"; one trailing dot is dropped
    /// since qualification adds its own.
    pub fn new(zone_id: impl Into<String>, domain_suffix: Option<&str>) -> Self {
        Self {
            zone_id: zone_id.into(),
            domain_suffix: normalize_domain_suffix(domain_suffix),
        }
    }

    /// Domain suffix, if one is configured
    ///
    /// Deserialized configs are not normalised on the way in, so blanks and
    /// a trailing dot are handled here as well.
    pub fn domain_suffix(&self) -> Option<&str> {
        let suffix = self.domain_suffix.as_deref()?.trim();
        let suffix = suffix.strip_suffix('.').unwrap_or(suffix);
        (!suffix.is_empty()).then_some(suffix)
    }

    /// Validate the zone configuration
    pub fn validate(&self) -> Result<()> {
        if self.zone_id.trim().is_empty() {
            return Err(Error::config("Zone id cannot be empty"));
        }
        if let Some(suffix) = self.domain_suffix() {
            validate_domain_name(suffix)?;
        }
        Ok(())
    }
}

/// Zone service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneServiceConfig {
    /// Cloudflare zone service
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Look records up but do not submit changes
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom zone service
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ZoneServiceConfig {
    /// Validate the zone service configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ZoneServiceConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ZoneServiceConfig::Custom { factory, config } => {
                validate_custom("zone service", factory, config)
            }
        }
    }

    /// Registry key for this zone service
    pub fn type_name(&self) -> &str {
        match self {
            ZoneServiceConfig::Cloudflare { .. } => "cloudflare",
            ZoneServiceConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Instance directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstanceDirectoryConfig {
    /// JSON inventory file
    File {
        /// Path to the inventory file
        path: String,
    },

    /// Custom instance directory
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl InstanceDirectoryConfig {
    /// Validate the instance directory configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            InstanceDirectoryConfig::File { path } => {
                if path.trim().is_empty() {
                    return Err(Error::config("Inventory file path cannot be empty"));
                }
                Ok(())
            }
            InstanceDirectoryConfig::Custom { factory, config } => {
                validate_custom("instance directory", factory, config)
            }
        }
    }

    /// Registry key for this instance directory
    pub fn type_name(&self) -> &str {
        match self {
            InstanceDirectoryConfig::File { .. } => "file",
            InstanceDirectoryConfig::Custom { factory, .. } => factory,
        }
    }
}

fn validate_custom(kind: &str, factory: &str, config: &serde_json::Value) -> Result<()> {
    if factory.is_empty() {
        return Err(Error::config(format!("Custom {} factory cannot be empty", kind)));
    }
    if config.is_null() {
        return Err(Error::config(format!("Custom {} config cannot be null", kind)));
    }
    Ok(())
}

fn normalize_domain_suffix(suffix: Option<&str>) -> Option<String> {
    let suffix = suffix?.trim();
    let suffix = suffix.strip_suffix('.').unwrap_or(suffix);
    if suffix.is_empty() {
        None
    } else {
        Some(suffix.to_lowercase())
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: total length, label length, label characters.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!("Domain name has empty label: '{}'", domain)));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_domain_suffix_means_unqualified() {
        assert_eq!(ZoneConfig::new("Z1", Some("")).domain_suffix(), None);
        assert_eq!(ZoneConfig::new("Z1", Some("  ")).domain_suffix(), None);
        assert_eq!(ZoneConfig::new("Z1", None).domain_suffix(), None);
    }

    #[test]
    fn domain_suffix_trailing_dot_is_dropped() {
        let zone = ZoneConfig::new("Z1", Some("Example.com."));
        assert_eq!(zone.domain_suffix(), Some("example.com"));
        assert!(zone.validate().is_ok());
    }

    #[test]
    fn deserialized_blank_suffix_is_unqualified() {
        let zone: ZoneConfig =
            serde_json::from_str(r#"{"zone_id": "Z1", "domain_suffix": ""}"#).unwrap();
        assert_eq!(zone.domain_suffix(), None);
        assert!(zone.validate().is_ok());
    }

    #[test]
    fn zone_id_is_required() {
        assert!(ZoneConfig::new("", Some("example.com")).validate().is_err());
    }

    #[test]
    fn invalid_domain_suffix_is_rejected() {
        assert!(ZoneConfig::new("Z1", Some("exa_mple.com")).validate().is_err());
        assert!(ZoneConfig::new("Z1", Some("-example.com")).validate().is_err());
        assert!(ZoneConfig::new("Z1", Some("example..com")).validate().is_err());
        assert!(validate_domain_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn zone_service_config_round_trips_by_tag() {
        let config: ZoneServiceConfig =
            serde_json::from_str(r#"{"type": "cloudflare", "api_token": "abc"}"#).unwrap();
        assert_eq!(config.type_name(), "cloudflare");
        assert!(config.validate().is_ok());

        let empty = ZoneServiceConfig::Cloudflare {
            api_token: String::new(),
            dry_run: false,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn custom_configs_need_factory_and_body() {
        let config = InstanceDirectoryConfig::Custom {
            factory: "ec2".to_string(),
            config: serde_json::Value::Null,
        };
        assert!(config.validate().is_err());

        let config = InstanceDirectoryConfig::Custom {
            factory: "ec2".to_string(),
            config: serde_json::json!({"region": "us-east-1"}),
        };
        assert_eq!(config.type_name(), "ec2");
        assert!(config.validate().is_ok());
    }
}
