// # Instance Directory Trait
//
// Defines the interface for looking up what the cloud knows about an
// instance: its current public address and its tags.
//
// ## Implementations
//
// - In-memory: `StaticInstanceDirectory`
// - JSON inventory file: `FileInstanceDirectory`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single key/value tag attached to an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key, compared case-insensitively
    pub key: String,
    /// Tag value
    pub value: String,
}

impl Tag {
    /// Create a tag
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// What the directory reports about one instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescription {
    /// Current public address, absent if the instance has none
    #[serde(default)]
    pub public_address: Option<String>,

    /// Tags in the order the directory returned them
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl InstanceDescription {
    /// Create a description
    pub fn new(public_address: Option<&str>, tags: Vec<Tag>) -> Self {
        Self {
            public_address: public_address.map(str::to_string),
            tags,
        }
    }
}

/// Trait for instance directory implementations
///
/// A directory is read exactly once per invocation and must not cache
/// answers across invocations.
#[async_trait]
pub trait InstanceDirectory: Send + Sync {
    /// Describe an instance
    ///
    /// # Returns
    ///
    /// - `Ok(Some(_))`: The instance exists
    /// - `Ok(None)`: The directory has no such instance
    /// - `Err(Error)`: The directory could not be queried
    async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceDescription>, crate::Error>;

    /// Directory name (for logging)
    fn directory_name(&self) -> &'static str;
}

/// Helper trait for constructing instance directories from configuration
pub trait InstanceDirectoryFactory: Send + Sync {
    /// Create an InstanceDirectory instance from configuration
    fn create(
        &self,
        config: &crate::config::InstanceDirectoryConfig,
    ) -> Result<Box<dyn InstanceDirectory>, crate::Error>;
}
