//! Docker Engine API client.

use std::sync::OnceLock;

use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::settings::{EngineSettings, TlsSettings};
use crate::api::SwarmApi;
use crate::model::{Config, ConfigId, ConfigSpec, Service, ServiceId, ServiceSpec, Version};
use crate::{Error, Result};

/// Installs the process-wide rustls crypto provider reqwest builds its TLS
/// config from. Safe to call more than once.
pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "ID")]
    id: ConfigId,
}

#[derive(Debug, Default, Deserialize)]
struct UpdateResponse {
    #[serde(rename = "Warnings", default)]
    warnings: Option<Vec<String>>,
}

/// [`SwarmApi`] backed by a swarm manager's Engine API.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    client: Client,
    settings: EngineSettings,
}

impl DockerEngine {
    /// Builds the HTTP client, loading TLS material from disk when configured.
    pub async fn connect(settings: EngineSettings) -> Result<Self> {
        install_rustls_provider();
        let mut builder = Client::builder();

        if !settings.timeout.is_zero() {
            builder = builder.timeout(settings.timeout);
        }

        if let Some(path) = settings.socket_path() {
            #[cfg(unix)]
            {
                builder = builder.unix_socket(path.to_path_buf());
            }
            #[cfg(not(unix))]
            {
                return Err(Error::config(format!(
                    "unix socket {} is not supported on this platform",
                    path.display()
                )));
            }
        }

        if let Some(tls) = &settings.tls {
            builder = apply_tls(builder, tls).await?;
        }

        let client = builder.build()?;
        debug!(
            base_url = %settings.base_url(),
            api_version = %settings.api_version,
            "Engine client ready"
        );

        Ok(Self { client, settings })
    }

    /// Wraps an existing client, for callers that manage their own transport.
    pub fn with_client(client: Client, settings: EngineSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        self.settings.endpoint(path)
    }

    /// Sends a request. Transport failures are errors; non-2xx answers come
    /// back as `Err((status, message))` for the caller to classify.
    async fn send(
        &self,
        request: RequestBuilder,
    ) -> Result<std::result::Result<Response, (StatusCode, String)>> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(Ok(response));
        }
        let message = error_message(response).await;
        debug!(status = %status, message = %message, "Engine request failed");
        Ok(Err((status, message)))
    }
}

async fn apply_tls(
    mut builder: reqwest::ClientBuilder,
    tls: &TlsSettings,
) -> Result<reqwest::ClientBuilder> {
    builder = builder.use_rustls_tls();

    if let Some(ca_file) = tls.ca_file() {
        let ca = tokio::fs::read(&ca_file).await?;
        builder = builder.add_root_certificate(Certificate::from_pem(&ca)?);
    }

    if let (Some(cert_file), Some(key_file)) = (tls.cert_file(), tls.key_file()) {
        let mut pem = tokio::fs::read(&cert_file).await?;
        pem.push(b'\n');
        pem.extend(tokio::fs::read(&key_file).await?);
        builder = builder.identity(Identity::from_pem(&pem)?);
    }

    if !tls.verify {
        warn!("TLS verification disabled for the engine connection");
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder)
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) => serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or_else(|_| {
                if text.trim().is_empty() {
                    status.to_string()
                } else {
                    text.trim().to_string()
                }
            }),
        Err(_) => status.to_string(),
    }
}

fn api_error(status: StatusCode, message: String) -> Error {
    Error::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl SwarmApi for DockerEngine {
    async fn inspect_config(&self, id_or_name: &str) -> Result<Config> {
        debug!(config = %id_or_name, "Inspecting config");
        let url = self.url(&format!("/configs/{}", urlencoding::encode(id_or_name)));
        match self.send(self.client.get(url)).await? {
            Ok(response) => Ok(response.json().await?),
            Err((StatusCode::NOT_FOUND, _)) => Err(Error::not_found("config", id_or_name)),
            Err((status, message)) => Err(api_error(status, message)),
        }
    }

    async fn list_configs(&self) -> Result<Vec<Config>> {
        debug!("Listing configs");
        match self.send(self.client.get(self.url("/configs"))).await? {
            Ok(response) => Ok(response.json().await?),
            Err((status, message)) => Err(api_error(status, message)),
        }
    }

    async fn create_config(&self, spec: &ConfigSpec) -> Result<ConfigId> {
        debug!(name = %spec.name, size = spec.data.len(), "Creating config");
        let request = self.client.post(self.url("/configs/create")).json(spec);
        match self.send(request).await? {
            Ok(response) => Ok(response.json::<CreateResponse>().await?.id),
            Err((StatusCode::CONFLICT, _)) => Err(Error::AlreadyExists(spec.name.clone())),
            Err((status, message)) => Err(api_error(status, message)),
        }
    }

    async fn remove_config(&self, id: &ConfigId) -> Result<()> {
        debug!(config = %id, "Removing config");
        let url = self.url(&format!("/configs/{}", urlencoding::encode(id.as_str())));
        match self.send(self.client.delete(url)).await? {
            Ok(_) => Ok(()),
            Err((StatusCode::NOT_FOUND, _)) => Err(Error::not_found("config", id.as_str())),
            Err((status, message)) if status == StatusCode::CONFLICT || message.contains("in use") => {
                Err(Error::InUse {
                    id: id.to_string(),
                    message,
                })
            }
            Err((status, message)) => Err(api_error(status, message)),
        }
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        debug!("Listing services");
        match self.send(self.client.get(self.url("/services"))).await? {
            Ok(response) => Ok(response.json().await?),
            Err((status, message)) => Err(api_error(status, message)),
        }
    }

    async fn update_service(
        &self,
        id: &ServiceId,
        version: Version,
        spec: &ServiceSpec,
    ) -> Result<()> {
        debug!(service = %id, version = version.index, "Updating service");
        let url = self.url(&format!("/services/{}/update", urlencoding::encode(id.as_str())));
        let request = self
            .client
            .post(url)
            .query(&[("version", version.index)])
            .json(spec);

        match self.send(request).await? {
            Ok(response) => {
                let body = response.json::<UpdateResponse>().await.unwrap_or_default();
                for warning in body.warnings.unwrap_or_default() {
                    warn!(service = %id, "{}", warning);
                }
                Ok(())
            }
            Err((StatusCode::NOT_FOUND, _)) => Err(Error::not_found("service", id.as_str())),
            Err((status, message))
                if status == StatusCode::CONFLICT || message.contains("out of sequence") =>
            {
                Err(Error::VersionConflict {
                    service_id: id.to_string(),
                    version: version.index,
                    message,
                })
            }
            Err((status, message)) => Err(api_error(status, message)),
        }
    }
}
