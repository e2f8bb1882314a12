//! Plugin-based service registry
//!
//! The registry lets zone services and instance directories be registered
//! by name at startup, so the runner never hard-codes which implementation
//! backs which config.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lifecycle_dns_core::registry::ServiceRegistry;
//!
//! let registry = ServiceRegistry::new();
//! lifecycle_dns_core::directory::register(&registry);
//! lifecycle_dns_provider_cloudflare::register(&registry);
//!
//! let zone_service = registry.create_zone_service(&config.zone_service)?;
//! ```

use crate::config::{InstanceDirectoryConfig, ZoneServiceConfig};
use crate::error::{Error, Result};
use crate::traits::{InstanceDirectory, InstanceDirectoryFactory, ZoneService, ZoneServiceFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of zone service and instance directory factories
///
/// Uses interior mutability with RwLock, allowing concurrent reads and
/// exclusive writes.
#[derive(Default)]
pub struct ServiceRegistry {
    /// Registered zone service factories
    zone_services: RwLock<HashMap<String, Box<dyn ZoneServiceFactory>>>,

    /// Registered instance directory factories
    directories: RwLock<HashMap<String, Box<dyn InstanceDirectoryFactory>>>,
}

impl ServiceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone service factory
    ///
    /// # Parameters
    ///
    /// - `name`: Zone service type name (e.g., "cloudflare")
    /// - `factory`: Factory object for creating zone service instances
    pub fn register_zone_service(
        &self,
        name: impl Into<String>,
        factory: Box<dyn ZoneServiceFactory>,
    ) {
        let mut services = self
            .zone_services
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        services.insert(name.into(), factory);
    }

    /// Register an instance directory factory
    ///
    /// # Parameters
    ///
    /// - `name`: Directory type name (e.g., "file")
    /// - `factory`: Factory object for creating directory instances
    pub fn register_instance_directory(
        &self,
        name: impl Into<String>,
        factory: Box<dyn InstanceDirectoryFactory>,
    ) {
        let mut directories = self
            .directories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        directories.insert(name.into(), factory);
    }

    /// Create a zone service from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ZoneService>)`: Created zone service
    /// - `Err(Error)`: If the type is not registered or creation fails
    pub fn create_zone_service(&self, config: &ZoneServiceConfig) -> Result<Box<dyn ZoneService>> {
        let service_type = config.type_name();
        let services = self
            .zone_services
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = services
            .get(service_type)
            .ok_or_else(|| Error::config(format!("Unknown zone service type: {}", service_type)))?;

        factory.create(config)
    }

    /// Create an instance directory from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn InstanceDirectory>)`: Created directory
    /// - `Err(Error)`: If the type is not registered or creation fails
    pub fn create_instance_directory(
        &self,
        config: &InstanceDirectoryConfig,
    ) -> Result<Box<dyn InstanceDirectory>> {
        let directory_type = config.type_name();
        let directories = self
            .directories
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = directories.get(directory_type).ok_or_else(|| {
            Error::config(format!("Unknown instance directory type: {}", directory_type))
        })?;

        factory.create(config)
    }

    /// List all registered zone service types
    pub fn list_zone_services(&self) -> Vec<String> {
        let services = self
            .zone_services
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        services.keys().cloned().collect()
    }

    /// List all registered instance directory types
    pub fn list_instance_directories(&self) -> Vec<String> {
        let directories = self
            .directories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        directories.keys().cloned().collect()
    }

    /// Check if a zone service type is registered
    pub fn has_zone_service(&self, name: &str) -> bool {
        let services = self
            .zone_services
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        services.contains_key(name)
    }

    /// Check if an instance directory type is registered
    pub fn has_instance_directory(&self, name: &str) -> bool {
        let directories = self
            .directories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        directories.contains_key(name)
    }
}
