use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{GmhiError, Result};
use crate::model::params::GmhiParams;
use crate::model::profile::{AbundanceProfile, reduce_taxon_id};
use crate::model::table::{AbundanceTable, TableKind};
use crate::pipeline::stage1_convert::{FrequencyConverter, run_stage1};

#[derive(Debug, Clone, Default)]
pub struct NormalizeAudit {
    pub source_kind: Option<TableKind>,
    pub converted: bool,
    pub n_taxa_raw: usize,
    pub excluded_taxa: Vec<String>,
    pub merged_taxa: usize,
    pub zero_mass_samples: Vec<String>,
}

#[derive(Debug)]
pub struct Stage2Output {
    pub profile: AbundanceProfile,
    pub audit: NormalizeAudit,
}

/// Full entry normalization: convert counts once if needed, then
/// exclude -> reduce ids -> renormalize -> threshold.
pub fn normalize(
    table: AbundanceTable,
    params: &GmhiParams,
    converter: &dyn FrequencyConverter,
) -> Result<Stage2Output> {
    let stage1 = run_stage1(table, converter)?;
    let mut out = run_stage2(&stage1.table, params)?;
    out.audit.source_kind = Some(stage1.source_kind);
    out.audit.converted = stage1.converted;
    Ok(out)
}

pub fn run_stage2(table: &AbundanceTable, params: &GmhiParams) -> Result<Stage2Output> {
    if table.kind != TableKind::RelativeFrequency {
        return Err(GmhiError::InvalidParameter(
            "normalization expects a relative-frequency table".to_string(),
        ));
    }
    let pattern = compile_exclude_pattern(&params.exclude_pattern)?;

    let raw = AbundanceProfile {
        sample_ids: table.sample_ids.clone(),
        taxon_ids: table.taxon_ids.clone(),
        values: table.values.clone(),
    };
    let (filtered, excluded_taxa) = exclude_taxa(&raw, &pattern);
    info!(
        "excluded {} of {} taxa matching '{}'",
        excluded_taxa.len(),
        raw.n_taxa(),
        params.exclude_pattern
    );
    let (reduced, merged_taxa) = reduce_taxa(&filtered);
    if merged_taxa > 0 {
        warn!(
            "{} taxon identifiers collapsed onto an existing id after rank reduction; abundances summed",
            merged_taxa
        );
    }
    let (renormalized, zero_mass_samples) = renormalize(&reduced);
    for sample in &zero_mass_samples {
        warn!(
            "sample {} has no abundance left after exclusion; all values kept at 0",
            sample
        );
    }
    let profile = apply_threshold(&renormalized, params.relative_threshold);
    debug!(
        "normalized profile: samples={}, taxa={}",
        profile.n_samples(),
        profile.n_taxa()
    );

    Ok(Stage2Output {
        profile,
        audit: NormalizeAudit {
            source_kind: Some(table.kind),
            converted: false,
            n_taxa_raw: raw.n_taxa(),
            excluded_taxa,
            merged_taxa,
            zero_mass_samples,
        },
    })
}

pub fn compile_exclude_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        GmhiError::InvalidParameter(format!("invalid exclude pattern '{pattern}': {e}"))
    })
}

pub fn exclude_taxa(profile: &AbundanceProfile, pattern: &Regex) -> (AbundanceProfile, Vec<String>) {
    let mut keep = Vec::with_capacity(profile.n_taxa());
    let mut excluded = Vec::new();
    for (idx, taxon) in profile.taxon_ids.iter().enumerate() {
        if pattern.is_match(taxon) {
            excluded.push(taxon.clone());
        } else {
            keep.push(idx);
        }
    }
    (select_taxa(profile, &keep), excluded)
}

/// Reduces lineage ids to their last rank token; ids that collapse onto the
/// same token are merged by summing. Returns the number of merged rows.
pub fn reduce_taxa(profile: &AbundanceProfile) -> (AbundanceProfile, usize) {
    let mut taxon_ids: Vec<String> = Vec::new();
    let mut slot_of: HashMap<String, usize> = HashMap::new();
    let mut target = Vec::with_capacity(profile.n_taxa());
    let mut merged = 0usize;
    for raw in &profile.taxon_ids {
        let id = reduce_taxon_id(raw);
        match slot_of.get(&id) {
            Some(&slot) => {
                debug!("taxon '{}' reduces to existing id '{}'", raw, id);
                merged += 1;
                target.push(slot);
            }
            None => {
                let slot = taxon_ids.len();
                slot_of.insert(id.clone(), slot);
                taxon_ids.push(id);
                target.push(slot);
            }
        }
    }

    let values = profile
        .values
        .iter()
        .map(|row| {
            let mut out = vec![0.0; taxon_ids.len()];
            for (idx, &v) in row.iter().enumerate() {
                out[target[idx]] += v;
            }
            out
        })
        .collect();

    (
        AbundanceProfile {
            sample_ids: profile.sample_ids.clone(),
            taxon_ids,
            values,
        },
        merged,
    )
}

/// Rescales each sample to unit mass. Samples with no mass stay all-zero and
/// are reported back.
pub fn renormalize(profile: &AbundanceProfile) -> (AbundanceProfile, Vec<String>) {
    let mut zero_mass = Vec::new();
    let values = profile
        .values
        .iter()
        .zip(profile.sample_sums())
        .zip(&profile.sample_ids)
        .map(|((row, total), sample)| {
            if total == 0.0 {
                zero_mass.push(sample.clone());
                return row.clone();
            }
            row.iter().map(|v| v / total).collect()
        })
        .collect();
    (
        AbundanceProfile {
            sample_ids: profile.sample_ids.clone(),
            taxon_ids: profile.taxon_ids.clone(),
            values,
        },
        zero_mass,
    )
}

/// Zeroes every value strictly below `threshold`. No renormalization follows.
pub fn apply_threshold(profile: &AbundanceProfile, threshold: f64) -> AbundanceProfile {
    let values = profile
        .values
        .iter()
        .map(|row| {
            row.iter()
                .map(|&v| if v < threshold { 0.0 } else { v })
                .collect()
        })
        .collect();
    AbundanceProfile {
        sample_ids: profile.sample_ids.clone(),
        taxon_ids: profile.taxon_ids.clone(),
        values,
    }
}

fn select_taxa(profile: &AbundanceProfile, keep: &[usize]) -> AbundanceProfile {
    AbundanceProfile {
        sample_ids: profile.sample_ids.clone(),
        taxon_ids: keep.iter().map(|&i| profile.taxon_ids[i].clone()).collect(),
        values: profile
            .values
            .iter()
            .map(|row| keep.iter().map(|&i| row[i]).collect())
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_normalize.rs"]
mod tests;
