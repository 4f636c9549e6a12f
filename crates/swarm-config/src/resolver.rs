use std::sync::Arc;

use tracing::debug;

use crate::Result;
use crate::api::SwarmApi;
use crate::model::Config;

/// Turns a user-supplied name or ID into a full config object.
pub struct ConfigResolver {
    api: Arc<dyn SwarmApi>,
}

impl ConfigResolver {
    pub fn new(api: Arc<dyn SwarmApi>) -> Self {
        Self { api }
    }

    pub async fn resolve(&self, id_or_name: &str) -> Result<Config> {
        let config = self.api.inspect_config(id_or_name).await?;
        debug!(
            input = %id_or_name,
            id = %config.id,
            name = %config.name(),
            "Resolved config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::sandbox::InMemorySwarm;

    #[tokio::test]
    async fn test_resolves_by_name_and_id() {
        let swarm = Arc::new(InMemorySwarm::new());
        let blue = swarm.add_config("blue", "v1").await;
        let resolver = ConfigResolver::new(swarm);

        assert_eq!(resolver.resolve("blue").await.unwrap(), blue);
        assert_eq!(resolver.resolve(blue.id.as_str()).await.unwrap(), blue);
    }

    #[tokio::test]
    async fn test_unknown_config_is_not_found() {
        let resolver = ConfigResolver::new(Arc::new(InMemorySwarm::new()));

        let err = resolver.resolve("missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
