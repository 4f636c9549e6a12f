//! In-process swarm used for dry runs and tests.
//!
//! Enforces the same rules a swarm manager does for the calls the swap makes:
//! config names are unique among live configs, a config cannot be removed while
//! a service mounts it, service updates are gated by the version token and may
//! only reference live configs. Every write bumps a cluster-wide version
//! counter, like the raft index a manager assigns.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::SwarmApi;
use crate::model::{
    Config, ConfigId, ConfigReference, ConfigSpec, ContainerSpec, Service, ServiceId, ServiceSpec,
    Version,
};
use crate::{Error, Result};

/// One call made against the sandbox, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    InspectConfig(String),
    ListConfigs,
    CreateConfig(String),
    RemoveConfig(ConfigId),
    ListServices,
    UpdateService(ServiceId),
}

impl Call {
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Call::InspectConfig(_) | Call::ListConfigs | Call::ListServices
        )
    }
}

#[derive(Debug, Default)]
struct State {
    configs: BTreeMap<ConfigId, Config>,
    services: BTreeMap<ServiceId, Service>,
    index: u64,
    next_id: u64,
    calls: Vec<Call>,
}

impl State {
    fn bump(&mut self) -> Version {
        self.index += 1;
        Version::new(self.index)
    }

    fn fresh_id(&mut self, kind: &str) -> String {
        loop {
            self.next_id += 1;
            let id = format!("sandbox-{kind}-{}", self.next_id);
            let taken = self.configs.contains_key(&ConfigId(id.clone()))
                || self.services.contains_key(&ServiceId(id.clone()));
            if !taken {
                return id;
            }
        }
    }

    fn find_config(&self, id_or_name: &str) -> Result<&Config> {
        if let Some(config) = self.configs.get(&ConfigId::from(id_or_name)) {
            return Ok(config);
        }
        if let Some(config) = self.configs.values().find(|c| c.spec.name == id_or_name) {
            return Ok(config);
        }

        let mut by_prefix = self
            .configs
            .values()
            .filter(|c| !id_or_name.is_empty() && c.id.as_str().starts_with(id_or_name));
        match (by_prefix.next(), by_prefix.next()) {
            (Some(config), None) => Ok(config),
            (Some(_), Some(_)) => Err(Error::Api {
                status: 400,
                message: format!("multiple configs found with prefix {id_or_name}"),
            }),
            _ => Err(Error::not_found("config", id_or_name)),
        }
    }

    fn users_of(&self, id: &ConfigId) -> Vec<&str> {
        self.services
            .values()
            .filter(|s| s.spec.references(id))
            .map(|s| s.spec.name.as_str())
            .collect()
    }
}

/// A swarm held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemorySwarm {
    state: Mutex<State>,
}

impl InMemorySwarm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every config and service of `api` into a new sandbox.
    ///
    /// IDs and versions are kept, so a swap run against the copy reports the
    /// same objects a real run would touch.
    pub async fn snapshot(api: &dyn SwarmApi) -> Result<Self> {
        let configs = api.list_configs().await?;
        let services = api.list_services().await?;
        debug!(
            configs = configs.len(),
            services = services.len(),
            "Snapshotted cluster"
        );

        let index = configs
            .iter()
            .map(|c| c.version.index)
            .chain(services.iter().map(|s| s.version.index))
            .max()
            .unwrap_or_default();

        let state = State {
            configs: configs.into_iter().map(|c| (c.id.clone(), c)).collect(),
            services: services.into_iter().map(|s| (s.id.clone(), s)).collect(),
            index,
            ..Default::default()
        };

        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Creates a config directly, bypassing the call log.
    pub async fn add_config(&self, name: &str, data: impl Into<Bytes>) -> Config {
        self.add_config_spec(ConfigSpec::new(name, data)).await
    }

    pub async fn add_config_spec(&self, spec: ConfigSpec) -> Config {
        let mut state = self.state.lock().await;
        let config = Config {
            id: ConfigId(state.fresh_id("config")),
            version: state.bump(),
            spec,
        };
        state.configs.insert(config.id.clone(), config.clone());
        config
    }

    /// Creates a container service mounting `configs` in order, bypassing the
    /// call log.
    pub async fn add_service(&self, name: &str, configs: &[&Config]) -> Service {
        let mut state = self.state.lock().await;
        let references = configs
            .iter()
            .map(|config| {
                ConfigReference::new(config).with_file_target(&format!("/etc/{}", config.name()))
            })
            .collect();

        let mut spec = ServiceSpec {
            name: name.to_string(),
            ..Default::default()
        };
        spec.task_template.container_spec = Some(ContainerSpec {
            configs: references,
            ..Default::default()
        });

        let service = Service {
            id: ServiceId(state.fresh_id("service")),
            version: state.bump(),
            spec,
        };
        state.services.insert(service.id.clone(), service.clone());
        service
    }

    /// Bumps a service's version the way a concurrent writer would.
    pub async fn touch_service(&self, id: &ServiceId) {
        let mut state = self.state.lock().await;
        let version = state.bump();
        if let Some(service) = state.services.get_mut(id) {
            service.version = version;
        }
    }

    pub async fn service(&self, id: &ServiceId) -> Option<Service> {
        self.state.lock().await.services.get(id).cloned()
    }

    pub async fn config(&self, id: &ConfigId) -> Option<Config> {
        self.state.lock().await.configs.get(id).cloned()
    }

    /// Calls received through [`SwarmApi`], oldest first.
    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }
}

#[async_trait]
impl SwarmApi for InMemorySwarm {
    async fn inspect_config(&self, id_or_name: &str) -> Result<Config> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::InspectConfig(id_or_name.to_string()));
        state.find_config(id_or_name).cloned()
    }

    async fn list_configs(&self) -> Result<Vec<Config>> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::ListConfigs);
        Ok(state.configs.values().cloned().collect())
    }

    async fn create_config(&self, spec: &ConfigSpec) -> Result<ConfigId> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::CreateConfig(spec.name.clone()));

        if state.configs.values().any(|c| c.spec.name == spec.name) {
            return Err(Error::AlreadyExists(spec.name.clone()));
        }

        let config = Config {
            id: ConfigId(state.fresh_id("config")),
            version: state.bump(),
            spec: spec.clone(),
        };
        let id = config.id.clone();
        state.configs.insert(id.clone(), config);
        Ok(id)
    }

    async fn remove_config(&self, id: &ConfigId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::RemoveConfig(id.clone()));

        if !state.configs.contains_key(id) {
            return Err(Error::not_found("config", id.as_str()));
        }

        let users = state.users_of(id);
        if !users.is_empty() {
            return Err(Error::InUse {
                id: id.to_string(),
                message: format!(
                    "config is in use by the following services: {}",
                    users.join(", ")
                ),
            });
        }

        state.configs.remove(id);
        state.bump();
        Ok(())
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::ListServices);
        Ok(state.services.values().cloned().collect())
    }

    async fn update_service(
        &self,
        id: &ServiceId,
        version: Version,
        spec: &ServiceSpec,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::UpdateService(id.clone()));

        let current = state
            .services
            .get(id)
            .map(|s| s.version)
            .ok_or_else(|| Error::not_found("service", id.as_str()))?;

        if current != version {
            return Err(Error::VersionConflict {
                service_id: id.to_string(),
                version: version.index,
                message: "update out of sequence".to_string(),
            });
        }

        if let Some(missing) = spec
            .config_references()
            .iter()
            .find(|r| !state.configs.contains_key(&r.config_id))
        {
            return Err(Error::Api {
                status: 400,
                message: format!("config not found: {}", missing.config_id),
            });
        }

        let version = state.bump();
        if let Some(service) = state.services.get_mut(id) {
            service.spec = spec.clone();
            service.version = version;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inspect_by_unique_prefix() {
        let swarm = InMemorySwarm::new();
        let blue = swarm.add_config("blue", "v1").await;

        let found = swarm.inspect_config("sandbox-config-").await.unwrap();
        assert_eq!(found.id, blue.id);

        swarm.add_config("green", "v2").await;
        assert!(matches!(
            swarm.inspect_config("sandbox-config-").await,
            Err(Error::Api { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_refuses_referenced_config() {
        let swarm = InMemorySwarm::new();
        let blue = swarm.add_config("blue", "v1").await;
        swarm.add_service("web", &[&blue]).await;

        let err = swarm.remove_config(&blue.id).await.unwrap_err();
        assert!(matches!(err, Error::InUse { .. }));
        assert!(swarm.config(&blue.id).await.is_some());
    }

    #[tokio::test]
    async fn test_update_is_gated_by_version() {
        let swarm = InMemorySwarm::new();
        let blue = swarm.add_config("blue", "v1").await;
        let web = swarm.add_service("web", &[&blue]).await;

        swarm
            .update_service(&web.id, web.version, &web.spec)
            .await
            .unwrap();
        let err = swarm
            .update_service(&web.id, web.version, &web.spec)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::VersionConflict { .. }));
        assert!(swarm.service(&web.id).await.unwrap().version > web.version);
    }

    #[tokio::test]
    async fn test_snapshot_keeps_ids_and_versions() {
        let live = InMemorySwarm::new();
        let blue = live.add_config("blue", "v1").await;
        let web = live.add_service("web", &[&blue]).await;

        let copy = InMemorySwarm::snapshot(&live).await.unwrap();

        assert_eq!(copy.config(&blue.id).await, Some(blue));
        assert_eq!(copy.service(&web.id).await, Some(web.clone()));

        let created = copy
            .create_config(&ConfigSpec::new("green", "v2"))
            .await
            .unwrap();
        assert!(copy.config(&created).await.unwrap().version > web.version);
        assert!(live.config(&created).await.is_none());
    }
}
