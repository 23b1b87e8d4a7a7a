pub mod defs;
pub mod loader;

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::Side;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureSource {
    Default,
    File(PathBuf),
    Fitted,
}

impl SignatureSource {
    pub fn describe(&self) -> String {
        match self {
            SignatureSource::Default => "default".to_string(),
            SignatureSource::File(path) => format!("file:{}", path.display()),
            SignatureSource::Fitted => "fitted".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeciesList {
    pub side: Side,
    pub source: SignatureSource,
    pub species: Vec<String>,
    lookup: HashSet<String>,
}

impl SpeciesList {
    pub fn new(side: Side, source: SignatureSource, species: Vec<String>) -> Self {
        let lookup = species.iter().cloned().collect();
        Self {
            side,
            source,
            species,
            lookup,
        }
    }

    pub fn contains(&self, taxon: &str) -> bool {
        self.lookup.contains(taxon)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

/// Health-prevalent and health-scarce species used by the index.
/// Immutable once built; the scorer only reads it.
#[derive(Debug, Clone)]
pub struct SpeciesSignature {
    pub healthy: SpeciesList,
    pub non_healthy: SpeciesList,
}

impl SpeciesSignature {
    pub fn side(&self, side: Side) -> &SpeciesList {
        match side {
            Side::Healthy => &self.healthy,
            Side::NonHealthy => &self.non_healthy,
        }
    }

    pub fn overlap(&self) -> Vec<String> {
        self.healthy
            .species
            .iter()
            .filter(|s| self.non_healthy.contains(s))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/signature/tests.rs"]
mod tests;
