use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::Result;
use crate::api::SwarmApi;
use crate::model::{Config, ConfigSpec};

/// Creates config objects, used to bring a retired name back under new content.
pub struct ConfigDuplicator {
    api: Arc<dyn SwarmApi>,
}

impl ConfigDuplicator {
    pub fn new(api: Arc<dyn SwarmApi>) -> Self {
        Self { api }
    }

    pub async fn create_named(&self, name: &str, data: Bytes) -> Result<Config> {
        self.create(&ConfigSpec::new(name, data)).await
    }

    /// Re-creates `source`'s spec (name, labels, templating) with the payload
    /// of `content`. The name must no longer be held by a live config.
    pub async fn rematerialize(&self, source: &Config, content: &Config) -> Result<Config> {
        let spec = ConfigSpec {
            data: content.spec.data.clone(),
            ..source.spec.clone()
        };
        self.create(&spec).await
    }

    /// Creates the config and reads it back by its new ID.
    pub async fn create(&self, spec: &ConfigSpec) -> Result<Config> {
        let id = self.api.create_config(spec).await?;
        info!(id = %id, name = %spec.name, "Config created");
        self.api.inspect_config(id.as_str()).await
    }
}
