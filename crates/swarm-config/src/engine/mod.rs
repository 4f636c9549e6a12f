//! Engine API transport.

mod client;
mod settings;

pub use client::{DockerEngine, install_rustls_provider};
pub use settings::{
    DEFAULT_API_VERSION, DEFAULT_HOST, DEFAULT_TIMEOUT, EngineHost, EngineSettings, TlsSettings,
};
