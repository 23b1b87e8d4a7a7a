#[derive(Debug, Clone, PartialEq)]
pub struct SampleScore {
    pub sample_id: String,
    pub gmhi: f64,
}

/// One GMHI value per sample, in the profile's sample order.
#[derive(Debug, Clone, Default)]
pub struct GmhiResult {
    pub entries: Vec<SampleScore>,
}

impl GmhiResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.gmhi).collect()
    }
}
