// # lifecycle-dns-core
//
// Core library that keeps DNS records in step with compute instance
// lifecycle events.
//
// ## Architecture Overview
//
// - **event**: Lifecycle event payload and the state → DNS action mapping
// - **InstanceDirectory**: Trait for looking up an instance's address and tags
// - **ZoneService**: Trait for reading and mutating record sets in a zone
// - **InstanceResolver**: Derives host name and routing identifier from tags
// - **RecordReconciler**: Lookup, mutate, submit against the zone
// - **reporter**: Audit lines for event, change batch and result
// - **LifecycleEngine**: Runs one event through the whole pipeline
// - **ServiceRegistry**: Plugin-based registry for zone services and directories
//
// ## Invocation Model
//
// One event per invocation, no internal concurrency, no retries and no
// state carried between invocations. Any failure aborts the invocation and
// is handed back to whatever delivered the event.

pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod event;
pub mod reconciler;
pub mod registry;
pub mod reporter;
pub mod resolver;
pub mod timestamp;
pub mod traits;

// Re-export core types for convenience
pub use config::{InstanceDirectoryConfig, LifecycleDnsConfig, ZoneConfig, ZoneServiceConfig};
pub use directory::{FileInstanceDirectory, StaticInstanceDirectory};
pub use engine::LifecycleEngine;
pub use error::{Error, Result};
pub use event::{DnsAction, LifecycleEvent, interpret};
pub use reconciler::{ChangeResult, RecordReconciler};
pub use registry::ServiceRegistry;
pub use resolver::{InstanceResolver, InstanceSnapshot};
pub use traits::{InstanceDirectory, ZoneService};
