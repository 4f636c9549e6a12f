//! The four-phase config swap.
//!
//! Swarm configs can be neither edited nor renamed, so promoting new content
//! into an existing name slot takes four steps:
//!
//! 1. **Swap forward**: every service mounting the source is pointed at the
//!    target.
//! 2. **Retire source**: the now unreferenced source config is removed.
//! 3. **Re-materialize**: a new config is created under the source's name with
//!    the target's payload.
//! 4. **Swap back**: every service mounting the target is pointed at the new
//!    config.
//!
//! Afterwards the target's content lives under the source's name and the
//! target object is left unreferenced, ready for the next staging cycle.
//!
//! Phases run strictly in order and every error is fatal. Nothing is retried
//! and completed phases are not rolled back, so a failure can leave services
//! split between configs. The returned error names the phase that failed.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::SwarmApi;
use crate::duplicator::ConfigDuplicator;
use crate::error::Phase;
use crate::model::{Config, ConfigId, ServiceId};
use crate::resolver::ConfigResolver;
use crate::rewrite::rewrite;
use crate::scanner::ServiceScanner;
use crate::updater::Updater;
use crate::{Error, Result};

/// ID and name of a config taking part in a swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSummary {
    pub id: ConfigId,
    pub name: String,
}

impl From<&Config> for ConfigSummary {
    fn from(config: &Config) -> Self {
        Self {
            id: config.id.clone(),
            name: config.spec.name.clone(),
        }
    }
}

/// What a completed swap did, phase by phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub source: ConfigSummary,
    pub target: ConfigSummary,
    /// Services moved from the source to the target.
    pub swapped_forward: Vec<ServiceId>,
    /// The retired source object.
    pub removed: ConfigId,
    /// The config re-created under the source's name.
    pub recreated: ConfigSummary,
    /// Services moved from the target to the re-created config.
    pub swapped_back: Vec<ServiceId>,
}

/// Drives a swap against any [`SwarmApi`].
pub struct Migrator {
    resolver: ConfigResolver,
    scanner: ServiceScanner,
    updater: Updater,
    duplicator: ConfigDuplicator,
    api: Arc<dyn SwarmApi>,
}

impl Migrator {
    pub fn new(api: Arc<dyn SwarmApi>) -> Self {
        Self {
            resolver: ConfigResolver::new(api.clone()),
            scanner: ServiceScanner::new(api.clone()),
            updater: Updater::new(api.clone()),
            duplicator: ConfigDuplicator::new(api.clone()),
            api,
        }
    }

    /// Promotes the content of `to` into the name held by `from`.
    ///
    /// Both endpoints may be given as name or ID. Running this twice with the
    /// same arguments is not a no-op: the second run swaps the content back.
    pub async fn migrate(&self, from: &str, to: &str) -> Result<MigrationReport> {
        let (source, target) = self
            .resolve(from, to)
            .await
            .map_err(|e| e.in_phase(Phase::Resolve))?;

        info!(
            from = %source.name(),
            to = %target.name(),
            "Swapping services forward"
        );
        let swapped_forward = self
            .swap(&source, &target)
            .await
            .map_err(|e| e.in_phase(Phase::SwapForward))?;
        info!(
            from = %source.name(),
            to = %target.name(),
            services = ?swapped_forward,
            "Services swapped forward"
        );

        self.api
            .remove_config(&source.id)
            .await
            .map_err(|e| e.in_phase(Phase::RetireSource))?;
        info!(id = %source.id, name = %source.name(), "Source config removed");

        let recreated = self
            .duplicator
            .rematerialize(&source, &target)
            .await
            .map_err(|e| e.in_phase(Phase::Rematerialize))?;
        info!(
            id = %recreated.id,
            name = %recreated.name(),
            content_of = %target.name(),
            "Source name re-created"
        );

        let swapped_back = self
            .swap(&target, &recreated)
            .await
            .map_err(|e| e.in_phase(Phase::SwapBack))?;
        info!(
            from = %target.name(),
            to = %recreated.name(),
            services = ?swapped_back,
            "Services swapped back"
        );

        Ok(MigrationReport {
            source: ConfigSummary::from(&source),
            target: ConfigSummary::from(&target),
            swapped_forward,
            removed: source.id.clone(),
            recreated: ConfigSummary::from(&recreated),
            swapped_back,
        })
    }

    async fn resolve(&self, from: &str, to: &str) -> Result<(Config, Config)> {
        let source = self.resolver.resolve(from).await?;
        let target = self.resolver.resolve(to).await?;

        if source.id == target.id {
            return Err(Error::config(format!(
                "{from:?} and {to:?} resolve to the same config {}",
                source.id
            )));
        }

        Ok((source, target))
    }

    /// Rewrites every service referencing `from` to reference `to`, one
    /// update per changed service, each under its scan-time version.
    async fn swap(&self, from: &Config, to: &Config) -> Result<Vec<ServiceId>> {
        let services = self.scanner.list_all().await?;
        let mut updated = Vec::new();

        for service in &services {
            let result = rewrite(service, from, to);
            if !result.changed() {
                continue;
            }

            let id = self
                .updater
                .apply(&service.id, service.version, &result.spec)
                .await?;
            updated.push(id);
        }

        if updated.is_empty() {
            warn!(config = %from.name(), "No service references config");
        }

        Ok(updated)
    }
}
