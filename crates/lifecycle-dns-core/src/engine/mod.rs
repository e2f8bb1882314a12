//! Single-invocation lifecycle engine
//!
//! The engine runs one lifecycle event through the whole pipeline:
//!
//! ```text
//! LifecycleEvent
//!       │
//!       ▼
//! ┌──────────────┐   DnsAction   ┌──────────────────┐  InstanceSnapshot  ┌──────────────────┐
//! │  interpret   │──────────────▶│ InstanceResolver │───────────────────▶│ RecordReconciler │
//! └──────────────┘               └──────────────────┘                    └──────────────────┘
//!                                   (directory read)                   (lookup, then submit)
//!                                                                               │
//!                                                                               ▼
//!                                                                          ChangeResult
//! ```
//!
//! Every step completes before the next begins, and at most three external
//! calls are made: describe instance, find record, submit change. Nothing is
//! retried and nothing survives the invocation; redelivery is the trigger's
//! job.

use tracing::{debug, info};

use crate::config::{LifecycleDnsConfig, ZoneConfig};
use crate::error::Result;
use crate::event::{LifecycleEvent, interpret};
use crate::reconciler::{ChangeResult, RecordReconciler};
use crate::registry::ServiceRegistry;
use crate::reporter;
use crate::resolver::InstanceResolver;
use crate::traits::{InstanceDirectory, ZoneService};

/// Lifecycle engine
///
/// ## Lifecycle
///
/// 1. Create with [`LifecycleEngine::new()`] or [`LifecycleEngine::from_config()`]
/// 2. Call [`LifecycleEngine::handle()`] once per event
/// 3. Drop
///
/// Holds no state between calls to `handle`; concurrent invocations for
/// different instances need no coordination.
pub struct LifecycleEngine {
    /// Instance parameter resolver
    resolver: InstanceResolver,

    /// Record reconciler
    reconciler: RecordReconciler,
}

impl LifecycleEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `directory`: Instance directory implementation
    /// - `zone_service`: Zone service implementation
    /// - `zone`: Zone id and domain suffix
    pub fn new(
        directory: Box<dyn InstanceDirectory>,
        zone_service: Box<dyn ZoneService>,
        zone: ZoneConfig,
    ) -> Result<Self> {
        zone.validate()?;

        Ok(Self {
            resolver: InstanceResolver::new(directory, zone.domain_suffix()),
            reconciler: RecordReconciler::new(zone_service, zone.zone_id),
        })
    }

    /// Create an engine whose collaborators are built by registered factories
    pub fn from_config(config: &LifecycleDnsConfig, registry: &ServiceRegistry) -> Result<Self> {
        config.validate()?;

        let directory = registry.create_instance_directory(&config.instance_directory)?;
        let zone_service = registry.create_zone_service(&config.zone_service)?;

        Self::new(directory, zone_service, config.zone.clone())
    }

    /// Handle one lifecycle event
    ///
    /// The event is audited on entry and the result or failure on exit.
    pub async fn handle(&self, event: &LifecycleEvent) -> Result<ChangeResult> {
        reporter::report_event(event);

        match self.process(event).await {
            Ok(result) => {
                reporter::report(event, &result);
                Ok(result)
            }
            Err(e) => {
                reporter::report_failure(event, &e);
                Err(e)
            }
        }
    }

    async fn process(&self, event: &LifecycleEvent) -> Result<ChangeResult> {
        event.validate()?;

        let action = interpret(event)?;
        debug!(
            "Instance {} is {}: {}",
            event.instance_id(),
            event.state(),
            action
        );

        let snapshot = self.resolver.resolve(event.instance_id(), action).await?;

        info!(
            "{} {} for instance {} in zone {}",
            action,
            snapshot.host_name,
            snapshot.instance_id,
            self.reconciler.zone_id()
        );

        self.reconciler.reconcile_snapshot(&snapshot, action).await
    }
}
