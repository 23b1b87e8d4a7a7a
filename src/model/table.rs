#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Frequency,
    RelativeFrequency,
}

impl TableKind {
    pub fn name(self) -> &'static str {
        match self {
            TableKind::Frequency => "frequency",
            TableKind::RelativeFrequency => "relative-frequency",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    TaxaBySample,
    SampleByTaxa,
}

/// Raw abundance table as read from disk, stored sample-major.
#[derive(Debug, Clone)]
pub struct AbundanceTable {
    pub sample_ids: Vec<String>,
    pub taxon_ids: Vec<String>,
    pub values: Vec<Vec<f64>>,
    pub kind: TableKind,
}

impl AbundanceTable {
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn sample_sums(&self) -> Vec<f64> {
        self.values.iter().map(|row| row.iter().sum()).collect()
    }
}

// Whole-number cells with at least one sample above 100 can only be counts;
// fractions and MetaPhlAn percentages both stay at or below 100.
pub fn detect_kind(values: &[Vec<f64>]) -> TableKind {
    let all_whole = values
        .iter()
        .flat_map(|row| row.iter())
        .all(|v| v.fract() == 0.0);
    if !all_whole {
        return TableKind::RelativeFrequency;
    }
    let max_sum = values
        .iter()
        .map(|row| row.iter().sum::<f64>())
        .fold(0.0f64, f64::max);
    if max_sum > 100.0 {
        TableKind::Frequency
    } else {
        TableKind::RelativeFrequency
    }
}
