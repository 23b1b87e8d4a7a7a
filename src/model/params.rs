use crate::error::{GmhiError, Result};

pub const DEFAULT_EXCLUDE_PATTERN: &str = "unclassified|virus";

#[derive(Debug, Clone)]
pub struct GmhiParams {
    pub relative_threshold: f64,
    pub log_threshold: f64,
    pub theta_fold: f64,
    pub theta_diff: f64,
    pub exclude_pattern: String,
}

impl GmhiParams {
    pub fn default_v1() -> Self {
        Self {
            relative_threshold: 1e-5,
            log_threshold: 1e-5,
            theta_fold: 1.4,
            theta_diff: 10.0,
            exclude_pattern: DEFAULT_EXCLUDE_PATTERN.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_non_negative("relative threshold", self.relative_threshold)?;
        check_non_negative("log threshold", self.log_threshold)?;
        check_non_negative("theta fold", self.theta_fold)?;
        check_non_negative("theta diff", self.theta_diff)?;
        if self.log_threshold == 0.0 {
            return Err(GmhiError::InvalidParameter(
                "log threshold must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GmhiParams {
    fn default() -> Self {
        Self::default_v1()
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(GmhiError::InvalidParameter(format!(
            "{name} must be a non-negative finite number, got {value}"
        )));
    }
    Ok(())
}
