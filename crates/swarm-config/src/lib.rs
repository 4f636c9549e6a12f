//! Promote new content into a Docker Swarm config name while the services
//! mounting it keep running.
//!
//! Swarm configs are immutable and cannot be renamed. [`Migrator`] works around
//! that by moving services onto the new config, retiring the old object,
//! re-creating its name with the new content and moving the services back. See
//! [`migration`] for the protocol.

pub mod api;
pub mod duplicator;
pub mod engine;
pub mod error;
pub mod migration;
pub mod model;
pub mod resolver;
pub mod rewrite;
pub mod sandbox;
pub mod scanner;
pub mod updater;

pub use api::SwarmApi;
pub use engine::{DockerEngine, EngineSettings, TlsSettings};
pub use error::{Error, Phase, Result};
pub use migration::{ConfigSummary, MigrationReport, Migrator};
pub use sandbox::InMemorySwarm;
