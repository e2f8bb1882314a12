//! Built-in instance directories
//!
//! - [`StaticInstanceDirectory`]: in-memory, for embedding and tests
//! - [`FileInstanceDirectory`]: JSON inventory file, re-read on every lookup

pub mod file;
pub mod memory;

pub use file::{FileDirectoryFactory, FileInstanceDirectory};
pub use memory::StaticInstanceDirectory;

use crate::registry::ServiceRegistry;

/// Register the built-in directories that can be built from configuration
pub fn register(registry: &ServiceRegistry) {
    registry.register_instance_directory("file", Box::new(FileDirectoryFactory));
}
