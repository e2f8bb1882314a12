// # File Instance Directory
//
// InstanceDirectory backed by a JSON inventory file.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "instances": {
//     "i-0abc": {
//       "public_address": "203.0.113.9",
//       "tags": [
//         { "key": "hostname", "value": "web1" },
//         { "key": "identifier", "value": "blue" }
//       ]
//     }
//   }
// }
// ```
//
// ## Freshness
//
// The file is read on every lookup. Nothing is cached between invocations,
// so whatever maintains the inventory can rewrite it at any time.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::Error;
use crate::config::InstanceDirectoryConfig;
use crate::traits::{InstanceDescription, InstanceDirectory, InstanceDirectoryFactory};

/// Inventory file format version
const INVENTORY_FILE_VERSION: &str = "1.0";

/// Serializable inventory file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct InventoryFileFormat {
    version: String,
    #[serde(default)]
    instances: HashMap<String, InstanceDescription>,
}

/// Instance directory reading a JSON inventory file
#[derive(Debug, Clone)]
pub struct FileInstanceDirectory {
    path: PathBuf,
}

impl FileInstanceDirectory {
    /// Create a directory over an inventory file
    ///
    /// The file is not touched until the first lookup.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the inventory file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the inventory
    async fn load(&self) -> Result<HashMap<String, InstanceDescription>, Error> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::instance_directory(format!(
                "Failed to read inventory file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let inventory: InventoryFileFormat = serde_json::from_str(&content).map_err(|e| {
            Error::instance_directory(format!(
                "Failed to parse inventory file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if inventory.version != INVENTORY_FILE_VERSION {
            tracing::warn!(
                "Inventory file version mismatch: expected {}, got {}. \
                Attempting to use it anyway.",
                INVENTORY_FILE_VERSION,
                inventory.version
            );
        }

        tracing::debug!(
            "Loaded inventory {}: {} instances",
            self.path.display(),
            inventory.instances.len()
        );
        Ok(inventory.instances)
    }
}

#[async_trait]
impl InstanceDirectory for FileInstanceDirectory {
    async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceDescription>, Error> {
        let mut instances = self.load().await?;
        Ok(instances.remove(instance_id))
    }

    fn directory_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for creating file-backed directories
pub struct FileDirectoryFactory;

impl InstanceDirectoryFactory for FileDirectoryFactory {
    fn create(
        &self,
        config: &InstanceDirectoryConfig,
    ) -> Result<Box<dyn InstanceDirectory>, Error> {
        match config {
            InstanceDirectoryConfig::File { path } => {
                if path.trim().is_empty() {
                    return Err(Error::config("Inventory file path is required"));
                }
                Ok(Box::new(FileInstanceDirectory::new(path)))
            }
            _ => Err(Error::config("Invalid config for file instance directory")),
        }
    }
}
