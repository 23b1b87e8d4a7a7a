use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::{debug, info};

use crate::error::{GmhiError, Result};
use crate::model::table::{AbundanceTable, Orientation, TableKind, detect_kind};

pub mod constants;
pub mod meta;

const SAMPLE_ROW_HEADERS: &[&str] = &["sample-id", "sampleid", "sample_id", "#sampleid"];

// Rank prefixes and lineage separators only ever appear in taxon labels.
const LINEAGE_MARKERS: &[&str] = &["__", "|", ";"];

#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    pub orientation: Option<Orientation>,
    pub kind: Option<TableKind>,
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>> {
    if !path.exists() {
        return Err(GmhiError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn delimiter_for(path: &Path) -> char {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    if name.ends_with(".csv") { ',' } else { '\t' }
}

pub fn load_abundance_table(path: &Path, options: TableOptions) -> Result<AbundanceTable> {
    let mut reader = open_maybe_gz(path)?;
    let delim = delimiter_for(path);
    let mut buf = String::new();
    let mut line_no = 0usize;

    let header = loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            return Err(GmhiError::parse(path, "abundance table has no header"));
        }
        line_no += 1;
        let line = buf.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('#') && !line.contains(delim) {
            debug!("skipping comment line {}: {}", line_no, line);
            continue;
        }
        break split_cells(line, delim);
    };
    if header.len() < 2 {
        return Err(GmhiError::parse(
            path,
            format!("header on line {line_no} has fewer than 2 columns"),
        ));
    }

    let mut row_ids = Vec::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();
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
        let cells = split_cells(line, delim);
        if cells.len() != header.len() {
            return Err(GmhiError::parse(
                path,
                format!(
                    "line {} has {} columns, header has {}",
                    line_no,
                    cells.len(),
                    header.len()
                ),
            ));
        }
        let mut values = Vec::with_capacity(cells.len() - 1);
        for (col, cell) in cells[1..].iter().enumerate() {
            values.push(parse_abundance(path, cell, line_no, col + 2)?);
        }
        row_ids.push(cells[0].clone());
        rows.push(values);
    }
    if rows.is_empty() {
        return Err(GmhiError::parse(path, "abundance table has no data rows"));
    }

    let orientation = options
        .orientation
        .unwrap_or_else(|| detect_orientation(&header, &row_ids));
    let column_ids: Vec<String> = header[1..].to_vec();
    let (sample_ids, taxon_ids, values) = match orientation {
        Orientation::SampleByTaxa => (row_ids, column_ids, rows),
        Orientation::TaxaBySample => (column_ids, row_ids, transpose(&rows)),
    };
    ensure_unique_samples(path, &sample_ids)?;

    let kind = options.kind.unwrap_or_else(|| detect_kind(&values));
    info!(
        "loaded abundance table {}: samples={}, taxa={}, orientation={:?}, kind={}",
        path.display(),
        sample_ids.len(),
        taxon_ids.len(),
        orientation,
        kind.name()
    );

    Ok(AbundanceTable {
        sample_ids,
        taxon_ids,
        values,
        kind,
    })
}

/// Taxa are on whichever axis carries more lineage-style labels
/// (`k__...`, `a|b`, `a;b`). Without that signal a sample-id header cell
/// means samples are rows; anything else means taxa are rows.
pub fn detect_orientation(header: &[String], row_ids: &[String]) -> Orientation {
    let column_ids = header.get(1..).unwrap_or_default();
    let rows = lineage_fraction(row_ids);
    let columns = lineage_fraction(column_ids);
    if rows > columns {
        return Orientation::TaxaBySample;
    }
    if columns > rows {
        return Orientation::SampleByTaxa;
    }
    let first = header
        .first()
        .map(|cell| cell.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if SAMPLE_ROW_HEADERS.contains(&first.as_str()) {
        Orientation::SampleByTaxa
    } else {
        Orientation::TaxaBySample
    }
}

fn lineage_fraction(labels: &[String]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let tagged = labels
        .iter()
        .filter(|label| LINEAGE_MARKERS.iter().any(|m| label.contains(m)))
        .count();
    tagged as f64 / labels.len() as f64
}

fn split_cells(line: &str, delim: char) -> Vec<String> {
    line.split(delim).map(|s| s.trim().to_string()).collect()
}

fn parse_abundance(path: &Path, cell: &str, line_no: usize, col: usize) -> Result<f64> {
    let value: f64 = cell.parse().map_err(|_| {
        GmhiError::parse(
            path,
            format!("invalid abundance '{cell}' at line {line_no}, column {col}"),
        )
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(GmhiError::parse(
            path,
            format!("abundance must be a non-negative number, got '{cell}' at line {line_no}, column {col}"),
        ));
    }
    Ok(value)
}

fn transpose(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut out = vec![Vec::with_capacity(rows.len()); n_cols];
    for row in rows {
        for (col, &v) in row.iter().enumerate() {
            out[col].push(v);
        }
    }
    out
}

fn ensure_unique_samples(path: &Path, sample_ids: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for id in sample_ids {
        if !seen.insert(id.as_str()) {
            return Err(GmhiError::parse(path, format!("duplicate sample id '{id}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
