/// Samples x taxa relative abundances. Each normalization step returns a new
/// profile; nothing mutates a profile after it has been built.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceProfile {
    pub sample_ids: Vec<String>,
    pub taxon_ids: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl AbundanceProfile {
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn n_taxa(&self) -> usize {
        self.taxon_ids.len()
    }

    pub fn sample(&self, idx: usize) -> &[f64] {
        &self.values[idx]
    }

    pub fn sample_sums(&self) -> Vec<f64> {
        self.values.iter().map(|row| row.iter().sum()).collect()
    }
}

/// Reduces a delimited lineage (`k__A;p__B;s__C` or `k__A|...|s__C`) to its
/// most specific rank token.
pub fn reduce_taxon_id(raw: &str) -> String {
    let last = raw.rsplit([';', '|']).next().unwrap_or(raw);
    last.trim().to_string()
}
