// # Static Instance Directory
//
// In-memory implementation of InstanceDirectory.
//
// ## Purpose
//
// Lets the engine be embedded where instance facts are already known
// (the caller fills the directory), and backs the contract tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::{InstanceDescription, InstanceDirectory};

/// In-memory instance directory
///
/// # Example
///
/// ```rust,no_run
/// use lifecycle_dns_core::directory::StaticInstanceDirectory;
/// use lifecycle_dns_core::traits::{InstanceDescription, InstanceDirectory, Tag};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let directory = StaticInstanceDirectory::new();
///     directory
///         .insert(
///             "i-abc",
///             InstanceDescription::new(Some("203.0.113.9"), vec![Tag::new("hostname", "web1")]),
///         )
///         .await;
///
///     let found = directory.describe_instance("i-abc").await?;
///     assert!(found.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticInstanceDirectory {
    inner: Arc<RwLock<HashMap<String, InstanceDescription>>>,
}

impl StaticInstanceDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory pre-filled with instances
    pub fn with_instances<I, S>(instances: I) -> Self
    where
        I: IntoIterator<Item = (S, InstanceDescription)>,
        S: Into<String>,
    {
        let map = instances
            .into_iter()
            .map(|(id, description)| (id.into(), description))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Add or replace an instance
    pub async fn insert(&self, instance_id: impl Into<String>, description: InstanceDescription) {
        let mut guard = self.inner.write().await;
        guard.insert(instance_id.into(), description);
    }

    /// Remove an instance
    pub async fn remove(&self, instance_id: &str) -> Option<InstanceDescription> {
        let mut guard = self.inner.write().await;
        guard.remove(instance_id)
    }

    /// Number of known instances
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the directory is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl InstanceDirectory for StaticInstanceDirectory {
    async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceDescription>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(instance_id).cloned())
    }

    fn directory_name(&self) -> &'static str {
        "static"
    }
}
