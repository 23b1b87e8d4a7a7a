use std::collections::{BTreeSet, HashMap};
use std::io::BufRead;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{GmhiError, Result};
use crate::input::open_maybe_gz;

const ID_HEADERS: &[&str] = &["sample-id", "sampleid", "sample_id", "#sampleid", "id"];

#[derive(Debug, Clone)]
pub struct SampleMetadata {
    pub columns: Vec<String>,
    pub sample_ids: Vec<String>,
    pub rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl SampleMetadata {
    pub fn new(columns: Vec<String>, sample_ids: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let index = sample_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Self {
            columns,
            sample_ids,
            rows,
            index,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn contains_sample(&self, sample_id: &str) -> bool {
        self.index.contains_key(sample_id)
    }

    pub fn value(&self, sample_id: &str, column: usize) -> Option<&str> {
        let row = *self.index.get(sample_id)?;
        self.rows[row].get(column).map(|s| s.as_str())
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |r| r.get(column).map(|s| s.as_str()).unwrap_or(""))
    }
}

pub fn load_meta(path: &Path) -> Result<SampleMetadata> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();

    if reader.read_line(&mut buf)? == 0 {
        return Err(GmhiError::parse(path, "metadata file is empty"));
    }
    let header: Vec<String> = buf
        .trim_end_matches(['\r', '\n'])
        .split('\t')
        .map(|s| s.trim().to_string())
        .collect();
    if header.len() < 2 {
        return Err(GmhiError::parse(
            path,
            "metadata needs an id column and at least one attribute column",
        ));
    }

    let id_col = header
        .iter()
        .position(|h| ID_HEADERS.contains(&h.to_ascii_lowercase().as_str()))
        .unwrap_or(0);
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != id_col)
        .map(|(_, name)| name.clone())
        .collect();

    let mut sample_ids = Vec::new();
    let mut rows = Vec::new();
    let mut seen = BTreeSet::new();
    let mut line_no = 1usize;
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let id = fields.get(id_col).map(|s| s.trim()).unwrap_or("");
        if id.starts_with("#q2:") {
            continue;
        }
        if id.is_empty() {
            warn!("metadata line {} has empty sample id; skipping", line_no);
            continue;
        }
        if !seen.insert(id.to_string()) {
            warn!(
                "duplicate sample id in metadata; keeping first (line {}, sample {})",
                line_no, id
            );
            continue;
        }
        let row: Vec<String> = (0..header.len())
            .filter(|idx| *idx != id_col)
            .map(|idx| fields.get(idx).map(|s| s.trim()).unwrap_or("").to_string())
            .collect();
        sample_ids.push(id.to_string());
        rows.push(row);
    }

    info!(
        "loaded metadata {}: samples={}, columns={}",
        path.display(),
        sample_ids.len(),
        columns.len()
    );
    Ok(SampleMetadata::new(columns, sample_ids, rows))
}

pub fn validate_metadata_is_superset(meta: &SampleMetadata, sample_ids: &[String]) -> Result<()> {
    let missing: BTreeSet<&String> = sample_ids
        .iter()
        .filter(|id| !meta.contains_sample(id))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(GmhiError::MissingSamples(
        missing.into_iter().cloned().collect(),
    ))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/meta.rs"]
mod tests;
