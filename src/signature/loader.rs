use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{GmhiError, Result, Side};
use crate::model::profile::reduce_taxon_id;
use crate::signature::defs::default_species;
use crate::signature::{SignatureSource, SpeciesList, SpeciesSignature};

pub fn load_signature(
    healthy_path: Option<&Path>,
    non_healthy_path: Option<&Path>,
) -> Result<SpeciesSignature> {
    let healthy = load_side(Side::Healthy, healthy_path)?;
    let non_healthy = load_side(Side::NonHealthy, non_healthy_path)?;

    let signature = SpeciesSignature {
        healthy,
        non_healthy,
    };
    let overlap = signature.overlap();
    if !overlap.is_empty() {
        warn!(
            "{} species listed as both healthy and non-healthy: {}",
            overlap.len(),
            overlap.join(", ")
        );
    }
    info!(
        "species signature: healthy={} ({}), non-healthy={} ({})",
        signature.healthy.len(),
        signature.healthy.source.describe(),
        signature.non_healthy.len(),
        signature.non_healthy.source.describe()
    );
    Ok(signature)
}

pub fn load_side(side: Side, path: Option<&Path>) -> Result<SpeciesList> {
    let (source, species) = match path {
        Some(path) => (
            SignatureSource::File(path.to_path_buf()),
            read_species_file(path)?,
        ),
        None => (
            SignatureSource::Default,
            default_species(side)
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ),
    };
    let list = SpeciesList::new(side, source, species);
    if list.is_empty() {
        return Err(GmhiError::EmptySignature(list.side));
    }
    Ok(list)
}

pub fn read_species_file(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(GmhiError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_species_lines(&content))
}

/// One taxon per line, trimmed and reduced to its last rank token.
/// Lines that are blank after trimming are dropped rather than kept as empty
/// identifiers, so a whitespace-only file yields an empty list. Repeated
/// taxa keep their first position.
pub fn parse_species_lines(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let taxon = reduce_taxon_id(line);
        if taxon.is_empty() {
            continue;
        }
        if !seen.insert(taxon.clone()) {
            debug!("duplicate species '{}' on line {}; keeping first", taxon, idx + 1);
            continue;
        }
        out.push(taxon);
    }
    out
}
