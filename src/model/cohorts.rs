use std::collections::HashSet;

use crate::error::{GmhiError, Result};
use crate::input::meta::SampleMetadata;

pub const REST_STATE: &str = "rest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cohort {
    Healthy,
    NonHealthy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortStates {
    pub column: String,
    pub healthy: Vec<String>,
    pub non_healthy: Vec<String>,
}

/// Cohort of every table sample, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortLabels {
    pub labels: Vec<Cohort>,
}

impl CohortLabels {
    pub fn count(&self, cohort: Cohort) -> usize {
        self.labels.iter().filter(|&&c| c == cohort).count()
    }

    pub fn indices(&self, cohort: Cohort) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == cohort)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn ensure_both_present(&self) -> Result<()> {
        if self.count(Cohort::Healthy) == 0 {
            return Err(GmhiError::InvalidParameter(
                "healthy cohort has no samples".to_string(),
            ));
        }
        if self.count(Cohort::NonHealthy) == 0 {
            return Err(GmhiError::InvalidParameter(
                "non-healthy cohort has no samples".to_string(),
            ));
        }
        Ok(())
    }
}

fn split_states(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn is_rest(states: &[String]) -> bool {
    states.len() == 1 && states[0] == REST_STATE
}

pub fn resolve_cohort_states(
    meta: &SampleMetadata,
    column: &str,
    healthy_states: &str,
    non_healthy_states: &str,
) -> Result<CohortStates> {
    let col = meta.column_index(column).ok_or_else(|| {
        GmhiError::InvalidParameter(format!("'{column}' is not a column in your metadata."))
    })?;

    let healthy = split_states(healthy_states);
    let non_healthy = split_states(non_healthy_states);
    let healthy_set: HashSet<&String> = healthy.iter().collect();
    let non_healthy_set: HashSet<&String> = non_healthy.iter().collect();
    if healthy_set == non_healthy_set {
        return Err(GmhiError::InvalidParameter(
            "healthy_states and non_healthy_states parameters cannot be equal.".to_string(),
        ));
    }

    let mut column_values: Vec<String> = Vec::new();
    for v in meta.column_values(col) {
        if !column_values.iter().any(|x| x == v) {
            column_values.push(v.to_string());
        }
    }

    let rest_of = |others: &[String]| -> Vec<String> {
        column_values
            .iter()
            .filter(|v| !others.contains(*v))
            .cloned()
            .collect()
    };
    let (healthy, non_healthy) = if is_rest(&healthy) {
        (rest_of(&non_healthy), non_healthy)
    } else if is_rest(&non_healthy) {
        let rest = rest_of(&healthy);
        (healthy, rest)
    } else {
        (healthy, non_healthy)
    };

    for state in &healthy {
        if !column_values.contains(state) {
            return Err(GmhiError::InvalidParameter(format!(
                "Healthy state '{state}' is not represented by any members of '{column}' column in metadata."
            )));
        }
    }
    for state in &non_healthy {
        if !column_values.contains(state) {
            return Err(GmhiError::InvalidParameter(format!(
                "Non-healthy state '{state}' is not represented by any members of '{column}' column in metadata."
            )));
        }
    }

    let covered = meta
        .column_values(col)
        .filter(|v| healthy.iter().any(|s| s == *v) || non_healthy.iter().any(|s| s == *v))
        .count();
    if covered != meta.n_rows() {
        return Err(GmhiError::InvalidParameter(
            "Number of healthy and non-healthy state values is not equal to the number of rows in metadata."
                .to_string(),
        ));
    }

    Ok(CohortStates {
        column: column.to_string(),
        healthy,
        non_healthy,
    })
}

pub fn labels_from_states(
    meta: &SampleMetadata,
    states: &CohortStates,
    sample_ids: &[String],
) -> Result<CohortLabels> {
    let col = meta.column_index(&states.column).ok_or_else(|| {
        GmhiError::InvalidParameter(format!(
            "'{}' is not a column in your metadata.",
            states.column
        ))
    })?;
    let mut labels = Vec::with_capacity(sample_ids.len());
    for id in sample_ids {
        let value = meta
            .value(id, col)
            .ok_or_else(|| GmhiError::MissingSamples(vec![id.clone()]))?;
        if states.healthy.iter().any(|s| s == value) {
            labels.push(Cohort::Healthy);
        } else if states.non_healthy.iter().any(|s| s == value) {
            labels.push(Cohort::NonHealthy);
        } else {
            return Err(GmhiError::InvalidParameter(format!(
                "sample '{id}' has state '{value}' which is neither healthy nor non-healthy"
            )));
        }
    }
    Ok(CohortLabels { labels })
}

pub fn parse_binary_label(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Labels from a boolean / 0-1 column; `true` and `1` mark healthy samples.
pub fn binary_labels(
    meta: &SampleMetadata,
    column: &str,
    sample_ids: &[String],
) -> Result<CohortLabels> {
    let col = meta.column_index(column).ok_or_else(|| {
        GmhiError::InvalidParameter(format!("'{column}' is not a column in your metadata."))
    })?;
    let mut labels = Vec::with_capacity(sample_ids.len());
    for id in sample_ids {
        let value = meta
            .value(id, col)
            .ok_or_else(|| GmhiError::MissingSamples(vec![id.clone()]))?;
        match parse_binary_label(value) {
            Some(true) => labels.push(Cohort::Healthy),
            Some(false) => labels.push(Cohort::NonHealthy),
            None => {
                return Err(GmhiError::InvalidLabelType {
                    column: column.to_string(),
                    sample: id.clone(),
                    value: value.to_string(),
                });
            }
        }
    }
    Ok(CohortLabels { labels })
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/cohorts.rs"]
mod tests;
