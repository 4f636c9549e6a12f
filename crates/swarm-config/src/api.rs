//! The orchestrator operations the swap consumes.

use async_trait::async_trait;

use crate::Result;
use crate::model::{Config, ConfigId, ConfigSpec, Service, ServiceId, ServiceSpec, Version};

/// Control-plane calls against a swarm manager.
///
/// Implemented by [`crate::engine::DockerEngine`] for a live daemon and by
/// [`crate::sandbox::InMemorySwarm`] for dry runs and tests.
#[async_trait]
pub trait SwarmApi: Send + Sync {
    /// Looks a config up by full ID, unique ID prefix or name.
    async fn inspect_config(&self, id_or_name: &str) -> Result<Config>;

    async fn list_configs(&self) -> Result<Vec<Config>>;

    /// Creates a config and returns its new ID. Fails with
    /// [`crate::Error::AlreadyExists`] if a live config holds the name.
    async fn create_config(&self, spec: &ConfigSpec) -> Result<ConfigId>;

    async fn remove_config(&self, id: &ConfigId) -> Result<()>;

    /// Unfiltered snapshot of every service with its version token.
    async fn list_services(&self) -> Result<Vec<Service>>;

    /// Replaces a service spec. Fails with [`crate::Error::VersionConflict`]
    /// if `version` is no longer current.
    async fn update_service(
        &self,
        id: &ServiceId,
        version: Version,
        spec: &ServiceSpec,
    ) -> Result<()>;
}
