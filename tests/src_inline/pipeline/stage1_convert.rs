use std::cell::Cell;

use super::*;

fn table(kind: TableKind, values: Vec<Vec<f64>>) -> AbundanceTable {
    AbundanceTable {
        sample_ids: (0..values.len()).map(|i| format!("S{}", i + 1)).collect(),
        taxon_ids: (0..values[0].len()).map(|i| format!("s__T{}", i + 1)).collect(),
        values,
        kind,
    }
}

struct CountingConverter {
    calls: Cell<usize>,
}

impl FrequencyConverter for CountingConverter {
    fn to_relative(&self, table: &AbundanceTable) -> Result<AbundanceTable> {
        self.calls.set(self.calls.get() + 1);
        TotalSumScaling.to_relative(table)
    }
}

struct BrokenConverter;

impl FrequencyConverter for BrokenConverter {
    fn to_relative(&self, table: &AbundanceTable) -> Result<AbundanceTable> {
        Ok(table.clone())
    }
}

#[test]
fn test_total_sum_scaling() {
    let counts = table(TableKind::Frequency, vec![vec![30.0, 10.0, 60.0], vec![0.0, 0.0, 0.0]]);
    let rel = TotalSumScaling.to_relative(&counts).unwrap();
    assert_eq!(rel.kind, TableKind::RelativeFrequency);
    assert_eq!(rel.values[0], vec![0.3, 0.1, 0.6]);
    assert_eq!(rel.values[1], vec![0.0, 0.0, 0.0]);
    assert_eq!(rel.sample_ids, counts.sample_ids);
}

#[test]
fn test_frequency_table_converted_once() {
    let counts = table(TableKind::Frequency, vec![vec![1.0, 3.0]]);
    let converter = CountingConverter {
        calls: Cell::new(0),
    };
    let out = run_stage1(counts, &converter).unwrap();
    assert_eq!(converter.calls.get(), 1);
    assert!(out.converted);
    assert_eq!(out.source_kind, TableKind::Frequency);
    assert_eq!(out.table.values[0], vec![0.25, 0.75]);
}

#[test]
fn test_relative_table_passes_through() {
    let rel = table(TableKind::RelativeFrequency, vec![vec![0.2, 0.8]]);
    let converter = CountingConverter {
        calls: Cell::new(0),
    };
    let out = run_stage1(rel, &converter).unwrap();
    assert_eq!(converter.calls.get(), 0);
    assert!(!out.converted);
    assert_eq!(out.table.values[0], vec![0.2, 0.8]);
}

#[test]
fn test_converter_must_produce_relative_table() {
    let counts = table(TableKind::Frequency, vec![vec![1.0, 3.0]]);
    let err = run_stage1(counts, &BrokenConverter).unwrap_err();
    assert!(matches!(err, GmhiError::InvalidParameter(_)));
}
