use std::sync::Arc;

use tracing::info;

use crate::Result;
use crate::api::SwarmApi;
use crate::model::{ServiceId, ServiceSpec, Version};

/// Submits rewritten specs back to the orchestrator.
///
/// The update is gated by the version read at scan time. A stale version
/// surfaces as [`crate::Error::VersionConflict`] and is not retried. Rollout of
/// the new tasks is left to the orchestrator.
pub struct Updater {
    api: Arc<dyn SwarmApi>,
}

impl Updater {
    pub fn new(api: Arc<dyn SwarmApi>) -> Self {
        Self { api }
    }

    pub async fn apply(
        &self,
        service_id: &ServiceId,
        version: Version,
        spec: &ServiceSpec,
    ) -> Result<ServiceId> {
        self.api.update_service(service_id, version, spec).await?;
        info!(service = %service_id, name = %spec.name, "Service updated");
        Ok(service_id.clone())
    }
}
