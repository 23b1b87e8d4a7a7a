use tracing::{info, warn};

use crate::error::{GmhiError, Result, Side};
use crate::model::calibration::{CalibrationConstants, HitCounts, healthy_prime, non_healthy_prime};
use crate::model::cohorts::{Cohort, CohortLabels};
use crate::model::profile::AbundanceProfile;
use crate::signature::{SignatureSource, SpeciesList, SpeciesSignature};

#[derive(Debug, Clone, PartialEq)]
pub struct TaxonPrevalence {
    pub taxon: String,
    pub healthy_pct: f64,
    pub non_healthy_pct: f64,
    pub diff: f64,
    pub fold_healthy: f64,
    pub fold_non_healthy: f64,
    pub assignment: Option<Side>,
}

#[derive(Debug)]
pub struct FitOutput {
    pub signature: SpeciesSignature,
    pub constants: CalibrationConstants,
    pub prevalence: Vec<TaxonPrevalence>,
    pub n_healthy: usize,
    pub n_non_healthy: usize,
}

pub fn fit(
    profile: &AbundanceProfile,
    labels: &CohortLabels,
    theta_fold: f64,
    theta_diff: f64,
) -> Result<FitOutput> {
    check_labels(profile, labels)?;
    labels.ensure_both_present()?;

    let prevalence = compute_prevalence(profile, labels, theta_fold, theta_diff);
    let pick = |side: Side| -> Vec<String> {
        prevalence
            .iter()
            .filter(|p| p.assignment == Some(side))
            .map(|p| p.taxon.clone())
            .collect()
    };
    let healthy = pick(Side::Healthy);
    let non_healthy = pick(Side::NonHealthy);
    if healthy.is_empty() {
        return Err(GmhiError::EmptySignature(Side::Healthy));
    }
    if non_healthy.is_empty() {
        return Err(GmhiError::EmptySignature(Side::NonHealthy));
    }
    info!(
        "fitted signature: healthy={}, non-healthy={} (theta_fold={}, theta_diff={})",
        healthy.len(),
        non_healthy.len(),
        theta_fold,
        theta_diff
    );

    let signature = SpeciesSignature {
        healthy: SpeciesList::new(Side::Healthy, SignatureSource::Fitted, healthy),
        non_healthy: SpeciesList::new(Side::NonHealthy, SignatureSource::Fitted, non_healthy),
    };
    let constants = calibrate(profile, &signature, labels)?;

    Ok(FitOutput {
        signature,
        constants,
        prevalence,
        n_healthy: labels.count(Cohort::Healthy),
        n_non_healthy: labels.count(Cohort::NonHealthy),
    })
}

pub fn compute_prevalence(
    profile: &AbundanceProfile,
    labels: &CohortLabels,
    theta_fold: f64,
    theta_diff: f64,
) -> Vec<TaxonPrevalence> {
    let healthy_idx = labels.indices(Cohort::Healthy);
    let non_healthy_idx = labels.indices(Cohort::NonHealthy);

    let mut out = Vec::with_capacity(profile.n_taxa());
    for (taxon_idx, taxon) in profile.taxon_ids.iter().enumerate() {
        let healthy_pct = prevalence_pct(profile, &healthy_idx, taxon_idx);
        let non_healthy_pct = prevalence_pct(profile, &non_healthy_idx, taxon_idx);
        let diff = healthy_pct - non_healthy_pct;
        let fold_healthy = fold(healthy_pct, non_healthy_pct);
        let fold_non_healthy = fold(non_healthy_pct, healthy_pct);

        // A taxon absent from a cohort never joins that cohort's list.
        let assignment = if healthy_pct > 0.0 && fold_healthy >= theta_fold && diff >= theta_diff {
            Some(Side::Healthy)
        } else if non_healthy_pct > 0.0
            && fold_non_healthy >= theta_fold
            && diff <= -theta_diff
        {
            Some(Side::NonHealthy)
        } else {
            None
        };

        out.push(TaxonPrevalence {
            taxon: taxon.clone(),
            healthy_pct,
            non_healthy_pct,
            diff,
            fold_healthy,
            fold_non_healthy,
            assignment,
        });
    }
    out
}

fn prevalence_pct(profile: &AbundanceProfile, samples: &[usize], taxon_idx: usize) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let present = samples
        .iter()
        .filter(|&&s| profile.values[s][taxon_idx] > 0.0)
        .count();
    100.0 * present as f64 / samples.len() as f64
}

/// `num / den`, with `x / 0 = inf` for `x > 0` and `0 / 0 = 0`.
pub fn fold(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        if num > 0.0 { f64::INFINITY } else { 0.0 }
    } else {
        num / den
    }
}

pub fn hit_counts(profile: &AbundanceProfile, signature: &SpeciesSignature) -> Vec<HitCounts> {
    let healthy_cols = signature_columns(profile, &signature.healthy);
    let non_healthy_cols = signature_columns(profile, &signature.non_healthy);
    profile
        .values
        .iter()
        .map(|row| HitCounts {
            healthy: healthy_cols.iter().filter(|&&c| row[c] > 0.0).count() as u32,
            non_healthy: non_healthy_cols.iter().filter(|&&c| row[c] > 0.0).count() as u32,
        })
        .collect()
}

pub fn signature_columns(profile: &AbundanceProfile, list: &SpeciesList) -> Vec<usize> {
    profile
        .taxon_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| list.contains(id))
        .map(|(idx, _)| idx)
        .collect()
}

/// MH' from the healthy cohort and MN' from the non-healthy cohort, each the
/// median signature richness of the cohort's top-ranked 1%.
pub fn calibrate(
    profile: &AbundanceProfile,
    signature: &SpeciesSignature,
    labels: &CohortLabels,
) -> Result<CalibrationConstants> {
    check_labels(profile, labels)?;
    labels.ensure_both_present()?;

    let hits = hit_counts(profile, signature);
    let select = |cohort: Cohort| -> Vec<HitCounts> {
        labels.indices(cohort).into_iter().map(|i| hits[i]).collect()
    };
    let constants = CalibrationConstants {
        mh_prime: healthy_prime(&select(Cohort::Healthy)),
        mn_prime: non_healthy_prime(&select(Cohort::NonHealthy)),
    };
    info!(
        "calibration constants: MH'={}, MN'={}",
        constants.mh_prime, constants.mn_prime
    );
    if constants.mh_prime == 0.0 || constants.mn_prime == 0.0 {
        warn!("a calibration constant is 0; scoring with these constants will be rejected");
    }
    Ok(constants)
}

fn check_labels(profile: &AbundanceProfile, labels: &CohortLabels) -> Result<()> {
    if labels.labels.len() != profile.n_samples() {
        return Err(GmhiError::InvalidParameter(format!(
            "{} cohort labels for {} samples",
            labels.labels.len(),
            profile.n_samples()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_fit.rs"]
mod tests;
