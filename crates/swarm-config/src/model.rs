//! Swarm objects as the Engine API serializes them.
//!
//! Only the fields the swap reads or writes are typed. Everything else in a
//! service spec is carried through untouched in flattened JSON maps, because a
//! service update replaces the whole spec and a dropped field would silently
//! reset that part of the service.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a swarm config object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(pub String);

/// Identifier of a swarm service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub String);

impl ConfigId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ServiceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Optimistic-concurrency token assigned by the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    #[serde(rename = "Index")]
    pub index: u64,
}

impl Version {
    pub fn new(index: u64) -> Self {
        Self { index }
    }
}

/// A live config object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "ID")]
    pub id: ConfigId,
    #[serde(rename = "Version", default)]
    pub version: Version,
    #[serde(rename = "Spec")]
    pub spec: ConfigSpec,
}

impl Config {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn data(&self) -> &Bytes {
        &self.spec.data
    }
}

/// User-defined part of a config. This is also the body of a create call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSpec {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(
        rename = "Labels",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: BTreeMap<String, String>,
    #[serde(rename = "Data", default, with = "base64_bytes")]
    pub data: Bytes,
    #[serde(rename = "Templating", default, skip_serializing_if = "Option::is_none")]
    pub templating: Option<Value>,
}

impl ConfigSpec {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            ..Default::default()
        }
    }
}

/// A service as listed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "ID")]
    pub id: ServiceId,
    #[serde(rename = "Version", default)]
    pub version: Version,
    #[serde(rename = "Spec")]
    pub spec: ServiceSpec,
}

impl Service {
    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(rename = "Name", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "TaskTemplate", default)]
    pub task_template: TaskTemplate,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceSpec {
    /// Config references in mount order. Plugin services have none.
    pub fn config_references(&self) -> &[ConfigReference] {
        self.task_template
            .container_spec
            .as_ref()
            .map(|c| c.configs.as_slice())
            .unwrap_or_default()
    }

    pub fn config_references_mut(&mut self) -> Option<&mut Vec<ConfigReference>> {
        self.task_template
            .container_spec
            .as_mut()
            .map(|c| &mut c.configs)
    }

    pub fn references(&self, id: &ConfigId) -> bool {
        self.config_references().iter().any(|r| &r.config_id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    #[serde(rename = "ContainerSpec", default, skip_serializing_if = "Option::is_none")]
    pub container_spec: Option<ContainerSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    #[serde(
        rename = "Configs",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub configs: Vec<ConfigReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One config mounted into a service. Placement (`File` or `Runtime`) stays
/// opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigReference {
    #[serde(rename = "ConfigID")]
    pub config_id: ConfigId,
    #[serde(rename = "ConfigName")]
    pub config_name: String,
    #[serde(flatten)]
    pub placement: Map<String, Value>,
}

impl ConfigReference {
    pub fn new(config: &Config) -> Self {
        Self {
            config_id: config.id.clone(),
            config_name: config.spec.name.clone(),
            placement: Map::new(),
        }
    }

    pub fn with_file_target(mut self, target: &str) -> Self {
        self.placement.insert(
            "File".to_string(),
            serde_json::json!({ "Name": target, "UID": "0", "GID": "0", "Mode": 292 }),
        );
        self
    }
}

/// The engine encodes empty Go maps and slices as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine_service() -> Value {
        json!({
            "ID": "svc1",
            "Version": { "Index": 42 },
            "CreatedAt": "2024-01-01T00:00:00Z",
            "Spec": {
                "Name": "web",
                "Labels": { "tier": "front" },
                "Mode": { "Replicated": { "Replicas": 2 } },
                "TaskTemplate": {
                    "ContainerSpec": {
                        "Image": "nginx:1.25",
                        "Configs": [{
                            "File": { "Name": "/etc/nginx/nginx.conf", "UID": "0", "GID": "0", "Mode": 292 },
                            "ConfigID": "cfg1",
                            "ConfigName": "blue"
                        }]
                    },
                    "RestartPolicy": { "Condition": "any" }
                }
            }
        })
    }

    #[test]
    fn test_service_spec_keeps_unknown_fields() {
        let service: Service = serde_json::from_value(engine_service()).unwrap();

        assert_eq!(service.version, Version::new(42));
        assert_eq!(service.name(), "web");
        assert!(service.spec.references(&ConfigId::from("cfg1")));

        let spec = serde_json::to_value(&service.spec).unwrap();
        assert_eq!(spec, engine_service()["Spec"]);
    }

    #[test]
    fn test_service_without_container_spec_has_no_references() {
        let service: Service = serde_json::from_value(json!({
            "ID": "plugin",
            "Version": { "Index": 1 },
            "Spec": { "Name": "p", "TaskTemplate": { "PluginSpec": { "Name": "x" } } }
        }))
        .unwrap();

        assert!(service.spec.config_references().is_empty());
        let spec = serde_json::to_value(&service.spec).unwrap();
        assert_eq!(spec["TaskTemplate"], json!({ "PluginSpec": { "Name": "x" } }));
    }

    #[test]
    fn test_null_collections_are_empty() {
        let config: Config = serde_json::from_value(json!({
            "ID": "cfg1",
            "Spec": { "Name": "blue", "Labels": null, "Data": null }
        }))
        .unwrap();
        assert!(config.spec.labels.is_empty());
        assert!(config.data().is_empty());

        let spec: ServiceSpec = serde_json::from_value(json!({
            "Name": "web",
            "TaskTemplate": { "ContainerSpec": { "Image": "nginx", "Configs": null } }
        }))
        .unwrap();
        assert!(spec.config_references().is_empty());
    }

    #[test]
    fn test_config_data_is_base64_on_the_wire() {
        let config: Config = serde_json::from_value(json!({
            "ID": "cfg1",
            "Version": { "Index": 3 },
            "Spec": { "Name": "blue", "Data": "aGVsbG8=", "Templating": { "Name": "golang" } }
        }))
        .unwrap();

        assert_eq!(config.data().as_ref(), b"hello");
        let spec = serde_json::to_value(&config.spec).unwrap();
        assert_eq!(
            spec,
            json!({ "Name": "blue", "Data": "aGVsbG8=", "Templating": { "Name": "golang" } })
        );
    }
}
