use crate::error::{GmhiError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationConstants {
    pub mh_prime: f64,
    pub mn_prime: f64,
}

impl CalibrationConstants {
    pub fn new(mh_prime: f64, mn_prime: f64) -> Result<Self> {
        let constants = Self { mh_prime, mn_prime };
        constants.validate()?;
        Ok(constants)
    }

    pub fn validate(&self) -> Result<()> {
        check_positive("mh_prime", self.mh_prime)?;
        check_positive("mn_prime", self.mn_prime)?;
        Ok(())
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GmhiError::InvalidCalibration { name, value });
    }
    Ok(())
}

/// Signature richness of one sample: how many healthy-signature (`healthy`)
/// and non-healthy-signature (`non_healthy`) taxa are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitCounts {
    pub healthy: u32,
    pub non_healthy: u32,
}

pub fn top_slice_len(cohort_size: usize) -> usize {
    (cohort_size / 100).max(1)
}

/// MH': rank by healthy hits descending, ties by non-healthy hits ascending,
/// then take the median healthy hits of the top 1%.
pub fn healthy_prime(counts: &[HitCounts]) -> f64 {
    let mut ranked = counts.to_vec();
    ranked.sort_by(|a, b| {
        b.healthy
            .cmp(&a.healthy)
            .then_with(|| a.non_healthy.cmp(&b.non_healthy))
    });
    let k = top_slice_len(ranked.len()).min(ranked.len());
    let slice: Vec<u32> = ranked[..k].iter().map(|c| c.healthy).collect();
    median_u32(&slice)
}

/// MN': the reverse ranking of MH' (healthy hits ascending, ties by
/// non-healthy hits descending), median non-healthy hits of the top 1%.
pub fn non_healthy_prime(counts: &[HitCounts]) -> f64 {
    let mut ranked = counts.to_vec();
    ranked.sort_by(|a, b| {
        a.healthy
            .cmp(&b.healthy)
            .then_with(|| b.non_healthy.cmp(&a.non_healthy))
    });
    let k = top_slice_len(ranked.len()).min(ranked.len());
    let slice: Vec<u32> = ranked[..k].iter().map(|c| c.non_healthy).collect();
    median_u32(&slice)
}

pub fn median_u32(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2] as f64
    } else {
        (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/calibration.rs"]
mod tests;
