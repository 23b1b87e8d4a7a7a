use tracing::{info, warn};

use crate::error::{GmhiError, Result};
use crate::model::table::{AbundanceTable, TableKind};

/// Turns a count table into per-sample relative frequencies.
pub trait FrequencyConverter {
    fn to_relative(&self, table: &AbundanceTable) -> Result<AbundanceTable>;
}

/// Divides every sample by its total count.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalSumScaling;

impl FrequencyConverter for TotalSumScaling {
    fn to_relative(&self, table: &AbundanceTable) -> Result<AbundanceTable> {
        let mut values = Vec::with_capacity(table.n_samples());
        for (sample, (row, total)) in table.values.iter().zip(table.sample_sums()).enumerate() {
            if total == 0.0 {
                warn!(
                    "sample {} has zero total count; relative frequencies left at 0",
                    table.sample_ids[sample]
                );
                values.push(vec![0.0; row.len()]);
                continue;
            }
            values.push(row.iter().map(|v| v / total).collect());
        }
        Ok(AbundanceTable {
            sample_ids: table.sample_ids.clone(),
            taxon_ids: table.taxon_ids.clone(),
            values,
            kind: TableKind::RelativeFrequency,
        })
    }
}

#[derive(Debug)]
pub struct Stage1Output {
    pub table: AbundanceTable,
    pub source_kind: TableKind,
    pub converted: bool,
}

pub fn run_stage1(
    table: AbundanceTable,
    converter: &dyn FrequencyConverter,
) -> Result<Stage1Output> {
    let source_kind = table.kind;
    match source_kind {
        TableKind::RelativeFrequency => Ok(Stage1Output {
            table,
            source_kind,
            converted: false,
        }),
        TableKind::Frequency => {
            info!("frequency table detected; converting to relative frequency");
            let converted = converter.to_relative(&table)?;
            if converted.kind != TableKind::RelativeFrequency {
                return Err(GmhiError::InvalidParameter(
                    "frequency converter did not return a relative-frequency table".to_string(),
                ));
            }
            Ok(Stage1Output {
                table: converted,
                source_kind,
                converted: true,
            })
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_convert.rs"]
mod tests;
