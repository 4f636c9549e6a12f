//! Engine connection settings from flags and the Docker environment.

use std::path::PathBuf;
use std::time::Duration;

use swarm_config::{EngineSettings, Result, TlsSettings};

use crate::cli::Args;

/// Mirrors the Docker CLI: any of `--tls`, `--tls-verify` or a cert path turns
/// TLS on, and certificates are only verified with `--tls-verify`.
pub fn engine_settings(args: &Args) -> Result<EngineSettings> {
    let tls = (args.tls || args.tls_verify || args.cert_path.is_some()).then(|| {
        let cert_path = args
            .cert_path
            .clone()
            .or_else(|| args.tls_verify.then(default_cert_path).flatten());
        TlsSettings {
            cert_path,
            verify: args.tls_verify,
        }
    });

    Ok(EngineSettings::new(&args.host)?
        .with_api_version(&args.api_version)?
        .with_tls(tls)
        .with_timeout(Duration::from_secs(args.timeout)))
}

fn default_cert_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".docker"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_config::engine::EngineHost;

    fn args(host: &str) -> Args {
        Args {
            from_config: "blue".to_string(),
            to_config: "green".to_string(),
            host: host.to_string(),
            api_version: "1.43".to_string(),
            tls: false,
            tls_verify: false,
            cert_path: None,
            timeout: 10,
            dry_run: false,
            json: false,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_plain_tcp() {
        let settings = engine_settings(&args("tcp://manager:2375")).unwrap();

        assert_eq!(settings.host, EngineHost::Tcp("manager:2375".to_string()));
        assert_eq!(settings.api_version, "1.43");
        assert_eq!(settings.tls, None);
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.base_url(), "http://manager:2375");
    }

    #[test]
    fn test_cert_path_without_verify() {
        let mut args = args("tcp://manager:2376");
        args.cert_path = Some(PathBuf::from("/certs"));

        let settings = engine_settings(&args).unwrap();

        assert_eq!(
            settings.tls,
            Some(TlsSettings {
                cert_path: Some(PathBuf::from("/certs")),
                verify: false,
            })
        );
        assert_eq!(settings.base_url(), "https://manager:2376");
    }

    #[test]
    fn test_tls_flag_without_certs() {
        let mut args = args("tcp://manager:2376");
        args.tls = true;

        let tls = engine_settings(&args).unwrap().tls.unwrap();

        assert_eq!(tls.cert_path, None);
        assert!(!tls.verify);
    }

    #[test]
    fn test_bad_host_is_rejected() {
        assert!(engine_settings(&args("ssh://manager")).is_err());
    }
}
