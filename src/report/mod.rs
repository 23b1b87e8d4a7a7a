pub mod json;
pub mod text;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    pub table: String,
    pub n_samples: usize,
    pub n_taxa_raw: usize,
    pub n_taxa_excluded: usize,
    pub n_taxa_merged: usize,
    pub n_taxa_retained: usize,
    pub table_kind: String,
    pub converted_to_relative: bool,
    pub zero_mass_samples: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SideSummary {
    pub source: String,
    pub size: usize,
    pub present_in_table: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureSummary {
    pub healthy: SideSummary,
    pub non_healthy: SideSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalibrationSummary {
    pub source: String,
    pub mh_prime: f64,
    pub mn_prime: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamsSummary {
    pub relative_threshold: f64,
    pub log_threshold: f64,
    pub theta_fold: f64,
    pub theta_diff: f64,
    pub exclude_pattern: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GmhiStats {
    pub min: f64,
    pub p10: f64,
    pub median: f64,
    pub p90: f64,
    pub max: f64,
    pub positive_fraction: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FitSummary {
    pub n_healthy_samples: usize,
    pub n_non_healthy_samples: usize,
    pub healthy_species: Vec<String>,
    pub non_healthy_species: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub tool: String,
    pub version: String,
    pub command: String,
    pub input: InputSummary,
    pub params: ParamsSummary,
    pub signature: SignatureSummary,
    pub calibration: CalibrationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gmhi: Option<GmhiStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitSummary>,
}

pub fn quantile_indexed(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let idx = ((n - 1) as f64 * p).ceil() as usize;
    sorted[idx]
}

pub fn median(values: &[f64]) -> f64 {
    quantile_indexed(values, 0.5)
}

pub fn p10(values: &[f64]) -> f64 {
    quantile_indexed(values, 0.10)
}

pub fn p90(values: &[f64]) -> f64 {
    quantile_indexed(values, 0.90)
}

pub fn gmhi_stats(values: &[f64]) -> Option<GmhiStats> {
    if values.is_empty() {
        return None;
    }
    let positive = values.iter().filter(|&&v| v > 0.0).count();
    Some(GmhiStats {
        min: quantile_indexed(values, 0.0),
        p10: p10(values),
        median: median(values),
        p90: p90(values),
        max: quantile_indexed(values, 1.0),
        positive_fraction: positive as f64 / values.len() as f64,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
