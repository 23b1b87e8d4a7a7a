use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::input::constants::render_constants;
use crate::model::calibration::CalibrationConstants;
use crate::model::params::GmhiParams;
use crate::model::profile::AbundanceProfile;
use crate::model::result::GmhiResult;
use crate::pipeline::stage2_normalize::NormalizeAudit;
use crate::pipeline::stage3_fit::{FitOutput, TaxonPrevalence};
use crate::pipeline::stage4_score::Stage4Output;
use crate::report::json::render_summary_json;
use crate::report::text::render_report_text;
use crate::report::{
    CalibrationSummary, FitSummary, InputSummary, ParamsSummary, SideSummary, SignatureSummary,
    SummaryData, gmhi_stats,
};
use crate::signature::{SpeciesList, SpeciesSignature};

pub const HEALTHY_LIST_FILE: &str = "healthy_species_list.txt";
pub const NON_HEALTHY_LIST_FILE: &str = "nonhealthy_species_list.txt";
pub const CONSTANTS_FILE: &str = "constants.txt";
pub const PREVALENCE_FILE: &str = "taxa_prevalence.tsv";
pub const DETAILS_FILE: &str = "gmhi_details.tsv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const REPORT_FILE: &str = "report.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Tsv,
    Csv,
}

impl TableFormat {
    pub fn delimiter(self) -> char {
        match self {
            TableFormat::Tsv => '\t',
            TableFormat::Csv => ',',
        }
    }

    pub fn gmhi_file_name(self) -> &'static str {
        match self {
            TableFormat::Tsv => "gmhi.tsv",
            TableFormat::Csv => "gmhi.csv",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryInput<'a> {
    pub command: &'a str,
    pub table_path: &'a Path,
    pub profile: &'a AbundanceProfile,
    pub audit: &'a NormalizeAudit,
    pub params: &'a GmhiParams,
    pub signature: &'a SpeciesSignature,
    pub constants: &'a CalibrationConstants,
    pub calibration_source: String,
    pub scored: Option<&'a Stage4Output>,
    pub fit: Option<&'a FitOutput>,
}

pub fn build_summary(input: &SummaryInput<'_>) -> SummaryData {
    let side = |list: &SpeciesList, present: Option<usize>| SideSummary {
        source: list.source.describe(),
        size: list.len(),
        present_in_table: present,
    };
    SummaryData {
        tool: "kira-gmhi".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        command: input.command.to_string(),
        input: InputSummary {
            table: input.table_path.display().to_string(),
            n_samples: input.profile.n_samples(),
            n_taxa_raw: input.audit.n_taxa_raw,
            n_taxa_excluded: input.audit.excluded_taxa.len(),
            n_taxa_merged: input.audit.merged_taxa,
            n_taxa_retained: input.profile.n_taxa(),
            table_kind: input
                .audit
                .source_kind
                .map(|k| k.name().to_string())
                .unwrap_or_default(),
            converted_to_relative: input.audit.converted,
            zero_mass_samples: input.audit.zero_mass_samples.clone(),
        },
        params: ParamsSummary {
            relative_threshold: input.params.relative_threshold,
            log_threshold: input.params.log_threshold,
            theta_fold: input.params.theta_fold,
            theta_diff: input.params.theta_diff,
            exclude_pattern: input.params.exclude_pattern.clone(),
        },
        signature: SignatureSummary {
            healthy: side(
                &input.signature.healthy,
                input.scored.map(|s| s.matched_healthy),
            ),
            non_healthy: side(
                &input.signature.non_healthy,
                input.scored.map(|s| s.matched_non_healthy),
            ),
        },
        calibration: CalibrationSummary {
            source: input.calibration_source.clone(),
            mh_prime: input.constants.mh_prime,
            mn_prime: input.constants.mn_prime,
        },
        gmhi: input
            .scored
            .filter(|s| !s.result.is_empty())
            .and_then(|s| gmhi_stats(&s.result.values())),
        fit: input.fit.map(|f| FitSummary {
            n_healthy_samples: f.n_healthy,
            n_non_healthy_samples: f.n_non_healthy,
            healthy_species: f.signature.healthy.species.clone(),
            non_healthy_species: f.signature.non_healthy.species.clone(),
        }),
    }
}

pub fn write_score_outputs(
    out_dir: &Path,
    scored: &Stage4Output,
    format: TableFormat,
) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let gmhi_path = out_dir.join(format.gmhi_file_name());
    write_gmhi_table(&gmhi_path, &scored.result, format)?;
    write_details(&out_dir.join(DETAILS_FILE), scored)?;
    info!("wrote GMHI table {}", gmhi_path.display());
    Ok(gmhi_path)
}

pub fn write_fit_outputs(out_dir: &Path, fit: &FitOutput) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    write_species_list(&out_dir.join(HEALTHY_LIST_FILE), &fit.signature.healthy)?;
    write_species_list(&out_dir.join(NON_HEALTHY_LIST_FILE), &fit.signature.non_healthy)?;
    write_text(&out_dir.join(CONSTANTS_FILE), &render_constants(&fit.constants))?;
    write_prevalence(&out_dir.join(PREVALENCE_FILE), &fit.prevalence)?;
    info!("wrote fitted signature and constants to {}", out_dir.display());
    Ok(())
}

pub fn write_summary_outputs(out_dir: &Path, summary: &SummaryData) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    write_text(&out_dir.join(SUMMARY_FILE), &render_summary_json(summary)?)?;
    write_text(&out_dir.join(REPORT_FILE), &render_report_text(summary))?;
    Ok(())
}

pub fn write_gmhi_table(path: &Path, result: &GmhiResult, format: TableFormat) -> Result<()> {
    let d = format.delimiter();
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "sample-id{d}GMHI")?;
    for entry in &result.entries {
        writeln!(w, "{}{d}{}", entry.sample_id, entry.gmhi)?;
    }
    w.flush()?;
    Ok(())
}

fn write_details(path: &Path, scored: &Stage4Output) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(
        w,
        "sample-id\tR_MH\tR_MN\tshannon_MH\tshannon_MN\tpsi_MH\tpsi_MN\tGMHI"
    )?;
    for (entry, diag) in scored.result.entries.iter().zip(&scored.diagnostics) {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            entry.sample_id,
            diag.richness_mh,
            diag.richness_mn,
            diag.shannon_mh,
            diag.shannon_mn,
            diag.psi_mh,
            diag.psi_mn,
            entry.gmhi
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_species_list(path: &Path, list: &SpeciesList) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for species in &list.species {
        writeln!(w, "{species}")?;
    }
    w.flush()?;
    Ok(())
}

fn write_prevalence(path: &Path, prevalence: &[TaxonPrevalence]) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(
        w,
        "taxon\tPH\tPNH\tdiff\tfold_H\tfold_NH\tassignment"
    )?;
    for p in prevalence {
        let assignment = match p.assignment {
            Some(side) => side.label(),
            None => "-",
        };
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            p.taxon,
            p.healthy_pct,
            p.non_healthy_pct,
            p.diff,
            p.fold_healthy,
            p.fold_non_healthy,
            assignment
        )?;
    }
    w.flush()?;
    Ok(())
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(content.as_bytes())?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_report.rs"]
mod tests;
