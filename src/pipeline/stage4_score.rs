use tracing::{debug, info};

use crate::error::{GmhiError, Result, Side};
use crate::model::calibration::CalibrationConstants;
use crate::model::profile::AbundanceProfile;
use crate::model::result::{GmhiResult, SampleScore};
use crate::pipeline::stage3_fit::signature_columns;
use crate::signature::SpeciesSignature;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleDiagnostics {
    pub richness_mh: u32,
    pub richness_mn: u32,
    pub shannon_mh: f64,
    pub shannon_mn: f64,
    pub psi_mh: f64,
    pub psi_mn: f64,
}

#[derive(Debug)]
pub struct Stage4Output {
    pub result: GmhiResult,
    pub diagnostics: Vec<SampleDiagnostics>,
    pub matched_healthy: usize,
    pub matched_non_healthy: usize,
}

pub fn score(
    profile: &AbundanceProfile,
    signature: &SpeciesSignature,
    constants: &CalibrationConstants,
    log_threshold: f64,
) -> Result<Stage4Output> {
    constants.validate()?;
    if !log_threshold.is_finite() || log_threshold <= 0.0 {
        return Err(GmhiError::InvalidParameter(format!(
            "log threshold must be a positive finite number, got {log_threshold}"
        )));
    }

    let healthy_cols = present_columns(profile, signature, Side::Healthy)?;
    let non_healthy_cols = present_columns(profile, signature, Side::NonHealthy)?;
    info!(
        "signature species present in table: healthy={}/{}, non-healthy={}/{}",
        healthy_cols.len(),
        signature.healthy.len(),
        non_healthy_cols.len(),
        signature.non_healthy.len()
    );

    let mut entries = Vec::with_capacity(profile.n_samples());
    let mut diagnostics = Vec::with_capacity(profile.n_samples());
    for (idx, sample_id) in profile.sample_ids.iter().enumerate() {
        let row = profile.sample(idx);
        let mh = positive_values(row, &healthy_cols);
        let mn = positive_values(row, &non_healthy_cols);

        let richness_mh = mh.len() as u32;
        let richness_mn = mn.len() as u32;
        let shannon_mh = shannon_positive(&mh);
        let shannon_mn = shannon_positive(&mn);
        let psi_mh = richness_mh as f64 / constants.mh_prime * shannon_mh;
        let psi_mn = richness_mn as f64 / constants.mn_prime * shannon_mn;
        let gmhi = ((psi_mh + log_threshold) / (psi_mn + log_threshold)).log10();
        debug!(
            "sample {}: R_MH={}, R_MN={}, psi_MH={:.6}, psi_MN={:.6}, GMHI={:.6}",
            sample_id, richness_mh, richness_mn, psi_mh, psi_mn, gmhi
        );

        entries.push(SampleScore {
            sample_id: sample_id.clone(),
            gmhi,
        });
        diagnostics.push(SampleDiagnostics {
            richness_mh,
            richness_mn,
            shannon_mh,
            shannon_mn,
            psi_mh,
            psi_mn,
        });
    }

    Ok(Stage4Output {
        result: GmhiResult { entries },
        diagnostics,
        matched_healthy: healthy_cols.len(),
        matched_non_healthy: non_healthy_cols.len(),
    })
}

/// Columns of `side`'s signature taxa that are positive in at least one
/// sample. None at all is a structural failure, not a per-sample one.
fn present_columns(
    profile: &AbundanceProfile,
    signature: &SpeciesSignature,
    side: Side,
) -> Result<Vec<usize>> {
    let cols: Vec<usize> = signature_columns(profile, signature.side(side))
        .into_iter()
        .filter(|&c| profile.values.iter().any(|row| row[c] > 0.0))
        .collect();
    if cols.is_empty() {
        return Err(GmhiError::NoMatchingSpecies(side));
    }
    Ok(cols)
}

fn positive_values(row: &[f64], cols: &[usize]) -> Vec<f64> {
    cols.iter().map(|&c| row[c]).filter(|&v| v > 0.0).collect()
}

/// `-sum(x ln x)` over strictly positive entries; zeros are not part of the
/// index set at all.
pub fn shannon_positive(values: &[f64]) -> f64 {
    let mut h = 0.0;
    for &x in values {
        if x > 0.0 {
            h -= x * x.ln();
        }
    }
    h
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_score.rs"]
mod tests;
