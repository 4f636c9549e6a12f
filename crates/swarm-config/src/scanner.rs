use std::sync::Arc;

use tracing::debug;

use crate::Result;
use crate::api::SwarmApi;
use crate::model::Service;

/// Point-in-time snapshot of every service in the cluster.
///
/// The listing is unfiltered; callers decide which services matter. Each
/// returned service carries the version token it must be updated under.
pub struct ServiceScanner {
    api: Arc<dyn SwarmApi>,
}

impl ServiceScanner {
    pub fn new(api: Arc<dyn SwarmApi>) -> Self {
        Self { api }
    }

    pub async fn list_all(&self) -> Result<Vec<Service>> {
        let services = self.api.list_services().await?;
        debug!(count = services.len(), "Scanned services");
        Ok(services)
    }
}
