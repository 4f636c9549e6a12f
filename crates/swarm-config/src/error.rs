//! Error types shared by every component of the config swap.

use std::fmt;

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The four steps of a swap, used to tag failures with the operation that
/// raised them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolve,
    SwapForward,
    RetireSource,
    Rematerialize,
    SwapBack,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Resolve => "resolve configs",
            Phase::SwapForward => "swap services forward",
            Phase::RetireSource => "remove source config",
            Phase::Rematerialize => "re-create source name",
            Phase::SwapBack => "swap services back",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("version conflict updating service {service_id} at version {version}: {message}")]
    VersionConflict {
        service_id: String,
        version: u64,
        message: String,
    },

    #[error("config name already in use: {0}")]
    AlreadyExists(String),

    #[error("config {id} is still in use: {message}")]
    InUse { id: String, message: String },

    #[error("engine returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to {phase}: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Tags this error with the phase it escaped from. Already tagged errors
    /// keep their original phase.
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            Error::Phase { .. } => self,
            other => Error::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The phase this error was raised in, if it has been tagged.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The underlying error with any phase tag removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Phase { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_tag_is_not_nested() {
        let err = Error::not_found("config", "blue")
            .in_phase(Phase::Resolve)
            .in_phase(Phase::SwapBack);

        assert_eq!(err.phase(), Some(Phase::Resolve));
        assert!(matches!(err.root(), Error::NotFound { .. }));
        assert_eq!(
            err.to_string(),
            "failed to resolve configs: config not found: blue"
        );
    }
}
