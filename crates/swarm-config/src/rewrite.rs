//! Reference rewriting, the only part of a swap that touches service specs.

use crate::model::{Config, Service, ServiceSpec};

/// Result of rewriting one service.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    /// The service spec with references moved over. Equal to the input spec
    /// when nothing matched.
    pub spec: ServiceSpec,
    /// How many reference entries were rewritten.
    pub rewritten: usize,
}

impl Rewrite {
    pub fn changed(&self) -> bool {
        self.rewritten > 0
    }
}

/// Points every reference to `from` at `to` instead.
///
/// Entries keep their position and their placement (target file, owner,
/// mode). Only the config ID and name of matching entries change.
pub fn rewrite(service: &Service, from: &Config, to: &Config) -> Rewrite {
    let mut spec = service.spec.clone();
    let mut rewritten = 0;

    if let Some(references) = spec.config_references_mut() {
        for reference in references.iter_mut().filter(|r| r.config_id == from.id) {
            reference.config_id = to.id.clone();
            reference.config_name = to.spec.name.clone();
            rewritten += 1;
        }
    }

    Rewrite { spec, rewritten }
}
