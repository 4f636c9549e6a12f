//! Where and how to reach the Engine API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "unix:///var/run/docker.sock";
pub const DEFAULT_API_VERSION: &str = "1.41";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parsed `DOCKER_HOST` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineHost {
    /// Local daemon socket.
    Unix(PathBuf),
    /// `tcp://host:port`; the scheme is picked from the TLS settings.
    Tcp(String),
    /// Explicit `http://` or `https://` endpoint.
    Http(Url),
}

impl EngineHost {
    pub fn parse(host: &str) -> Result<Self> {
        let host = host.trim();

        if let Some(path) = host.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(Error::config(format!("missing socket path in host {host:?}")));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        if let Some(authority) = host.strip_prefix("tcp://") {
            let authority = authority.trim_end_matches('/');
            let probe = Url::parse(&format!("http://{authority}"))
                .map_err(|e| Error::config(format!("invalid host {host:?}: {e}")))?;
            if probe.host_str().is_none_or(str::is_empty) {
                return Err(Error::config(format!("missing address in host {host:?}")));
            }
            return Ok(Self::Tcp(authority.to_string()));
        }

        if host.starts_with("http://") || host.starts_with("https://") {
            let url =
                Url::parse(host).map_err(|e| Error::config(format!("invalid host {host:?}: {e}")))?;
            return Ok(Self::Http(url));
        }

        Err(Error::config(format!(
            "unsupported host {host:?}, expected unix://, tcp://, http:// or https://"
        )))
    }
}

/// Client certificates and verification mode, as `DOCKER_CERT_PATH` and
/// `DOCKER_TLS_VERIFY` describe them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    /// Directory holding `ca.pem`, `cert.pem` and `key.pem`.
    pub cert_path: Option<PathBuf>,
    /// Whether the daemon certificate is checked.
    pub verify: bool,
}

impl TlsSettings {
    pub fn ca_file(&self) -> Option<PathBuf> {
        self.cert_path.as_deref().map(|p| p.join("ca.pem"))
    }

    pub fn cert_file(&self) -> Option<PathBuf> {
        self.cert_path.as_deref().map(|p| p.join("cert.pem"))
    }

    pub fn key_file(&self) -> Option<PathBuf> {
        self.cert_path.as_deref().map(|p| p.join("key.pem"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub host: EngineHost,
    pub api_version: String,
    pub tls: Option<TlsSettings>,
    /// Per-request timeout. Zero disables it.
    pub timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            host: EngineHost::Unix(PathBuf::from("/var/run/docker.sock")),
            api_version: DEFAULT_API_VERSION.to_string(),
            tls: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl EngineSettings {
    pub fn new(host: &str) -> Result<Self> {
        Ok(Self {
            host: EngineHost::parse(host)?,
            ..Default::default()
        })
    }

    pub fn with_api_version(mut self, version: &str) -> Result<Self> {
        self.api_version = normalize_api_version(version)?;
        Ok(self)
    }

    pub fn with_tls(mut self, tls: Option<TlsSettings>) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Socket path when talking to a local daemon.
    pub fn socket_path(&self) -> Option<&Path> {
        match &self.host {
            EngineHost::Unix(path) => Some(path),
            _ => None,
        }
    }

    /// Base URL every API path is appended to, without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.host {
            EngineHost::Unix(_) => "http://localhost".to_string(),
            EngineHost::Tcp(authority) => {
                let scheme = if self.tls.is_some() { "https" } else { "http" };
                format!("{scheme}://{authority}")
            }
            EngineHost::Http(url) => url.as_str().trim_end_matches('/').to_string(),
        }
    }

    /// Full URL of an API path such as `/configs`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/v{}{}", self.base_url(), self.api_version, path)
    }
}

fn normalize_api_version(version: &str) -> Result<String> {
    let version = version.trim().trim_start_matches('v');
    let valid = version
        .split('.')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    if version.is_empty() || !valid {
        return Err(Error::config(format!("invalid API version {version:?}")));
    }
    Ok(version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("unix:///var/run/docker.sock", "http://localhost/v1.41/configs")]
    #[case("tcp://10.0.0.5:2375", "http://10.0.0.5:2375/v1.41/configs")]
    #[case("tcp://manager:2375/", "http://manager:2375/v1.41/configs")]
    #[case("http://manager:2375/", "http://manager:2375/v1.41/configs")]
    #[case("https://manager:2376", "https://manager:2376/v1.41/configs")]
    fn test_endpoint(#[case] host: &str, #[case] expected: &str) {
        let settings = EngineSettings::new(host).unwrap();
        assert_eq!(settings.endpoint("/configs"), expected);
    }

    #[test]
    fn test_tcp_host_switches_to_https_with_tls() {
        let settings = EngineSettings::new("tcp://manager:2376")
            .unwrap()
            .with_tls(Some(TlsSettings {
                cert_path: Some(PathBuf::from("/certs")),
                verify: true,
            }));

        assert_eq!(settings.base_url(), "https://manager:2376");
        assert_eq!(
            settings.tls.as_ref().and_then(TlsSettings::ca_file),
            Some(PathBuf::from("/certs/ca.pem"))
        );
    }

    #[rstest]
    #[case("unix://")]
    #[case("tcp://")]
    #[case("npipe:////./pipe/docker_engine")]
    #[case("manager:2375")]
    fn test_rejects_bad_hosts(#[case] host: &str) {
        assert!(matches!(
            EngineSettings::new(host),
            Err(Error::Configuration(_))
        ));
    }

    #[rstest]
    #[case("1.43", Some("1.43"))]
    #[case("v1.41", Some("1.41"))]
    #[case("latest", None)]
    #[case("1..2", None)]
    #[case("", None)]
    fn test_api_version(#[case] input: &str, #[case] expected: Option<&str>) {
        let settings = EngineSettings::default().with_api_version(input);
        assert_eq!(
            settings.ok().map(|s| s.api_version),
            expected.map(str::to_string)
        );
    }
}
