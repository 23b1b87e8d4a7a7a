use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Healthy,
    NonHealthy,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Healthy => "Healthy",
            Side::NonHealthy => "Non-healthy",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug)]
pub enum GmhiError {
    #[error("No such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{0} species list is empty!")]
    EmptySignature(Side),

    #[error("none of the {0} signature species is present in the abundance table")]
    NoMatchingSpecies(Side),

    #[error("Missing samples in metadata: {{{}}}", format_ids(.0))]
    MissingSamples(Vec<String>),

    #[error("label column '{column}' must be boolean or 0/1 integer, found '{value}' (sample {sample})")]
    InvalidLabelType {
        column: String,
        sample: String,
        value: String,
    },

    #[error("invalid calibration: {name} must be a positive finite number, got {value}")]
    InvalidCalibration { name: &'static str, value: f64 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("parse error in {}: {msg}", .path.display())]
    Parse { path: PathBuf, msg: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GmhiError>;

impl GmhiError {
    pub fn parse(path: &std::path::Path, msg: impl Into<String>) -> Self {
        GmhiError::Parse {
            path: path.to_path_buf(),
            msg: msg.into(),
        }
    }
}

fn format_ids(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("'{id}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
