use std::path::Path;

use crate::error::{GmhiError, Result};
use crate::model::calibration::CalibrationConstants;

pub const H_CONSTANT_KEY: &str = "H_constant";
pub const NH_CONSTANT_KEY: &str = "NH_constant";

pub fn read_constants(path: &Path) -> Result<CalibrationConstants> {
    if !path.exists() {
        return Err(GmhiError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let (mh_prime, mn_prime) = parse_constants(path, &content)?;
    CalibrationConstants::new(mh_prime, mn_prime)
}

pub fn parse_constants(path: &Path, content: &str) -> Result<(f64, f64)> {
    let mut h = None;
    let mut nh = None;
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line.split_once(':').ok_or_else(|| {
            GmhiError::parse(path, format!("line {} is not 'key: value'", idx + 1))
        })?;
        let value: f64 = value.trim().parse().map_err(|_| {
            GmhiError::parse(
                path,
                format!("invalid number '{}' on line {}", value.trim(), idx + 1),
            )
        })?;
        match key.trim() {
            H_CONSTANT_KEY => h = Some(value),
            NH_CONSTANT_KEY => nh = Some(value),
            other => {
                return Err(GmhiError::parse(
                    path,
                    format!("unknown key '{}' on line {}", other, idx + 1),
                ));
            }
        }
    }
    match (h, nh) {
        (Some(h), Some(nh)) => Ok((h, nh)),
        (None, _) => Err(GmhiError::parse(path, format!("missing {H_CONSTANT_KEY}"))),
        (_, None) => Err(GmhiError::parse(path, format!("missing {NH_CONSTANT_KEY}"))),
    }
}

pub fn render_constants(constants: &CalibrationConstants) -> String {
    format!(
        "{}: {}\n{}: {}\n",
        H_CONSTANT_KEY, constants.mh_prime, NH_CONSTANT_KEY, constants.mn_prime
    )
}
