use std::path::PathBuf;

use clap::Parser;
use clap::builder::FalseyValueParser;
use swarm_config::engine::{DEFAULT_API_VERSION, DEFAULT_HOST};

/// Promote the content of TO_CONFIG into the name held by FROM_CONFIG.
///
/// Services mounting FROM_CONFIG are moved to TO_CONFIG, FROM_CONFIG is
/// removed and re-created under its old name with TO_CONFIG's content, then
/// every service mounting TO_CONFIG is moved onto the re-created config.
#[derive(Parser, Debug)]
#[command(name = "swarm-config-updater", version, about, long_about)]
pub struct Args {
    /// Config whose name receives the new content (name or ID)
    pub from_config: String,

    /// Config holding the content to promote (name or ID)
    pub to_config: String,

    /// Daemon socket or address to connect to
    #[arg(short = 'H', long, env = "DOCKER_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Engine API version to speak
    #[arg(long, env = "DOCKER_API_VERSION", default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Use TLS even without certificates
    #[arg(long)]
    pub tls: bool,

    /// Use TLS and verify the daemon certificate
    #[arg(long, env = "DOCKER_TLS_VERIFY", value_parser = FalseyValueParser::new())]
    pub tls_verify: bool,

    /// Directory holding ca.pem, cert.pem and key.pem
    #[arg(long, env = "DOCKER_CERT_PATH")]
    pub cert_path: Option<PathBuf>,

    /// Request timeout in seconds, 0 to disable
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Run the swap against a snapshot of the cluster without changing it
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
