mod error;
mod input;
mod logging;
mod model;
mod pipeline;
mod report;
mod signature;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use crate::error::{GmhiError, Result};
use crate::input::constants::read_constants;
use crate::input::meta::{SampleMetadata, load_meta, validate_metadata_is_superset};
use crate::input::{TableOptions, load_abundance_table};
use crate::model::calibration::CalibrationConstants;
use crate::model::cohorts::{CohortLabels, binary_labels, labels_from_states, resolve_cohort_states};
use crate::model::params::{DEFAULT_EXCLUDE_PATTERN, GmhiParams};
use crate::model::table::{Orientation, TableKind};
use crate::pipeline::stage1_convert::TotalSumScaling;
use crate::pipeline::stage2_normalize::{Stage2Output, normalize};
use crate::pipeline::stage3_fit::{calibrate, fit};
use crate::pipeline::stage4_score::score;
use crate::pipeline::stage5_report::{
    SummaryInput, TableFormat, build_summary, write_fit_outputs, write_score_outputs,
    write_summary_outputs,
};
use crate::signature::loader::load_signature;

#[derive(Debug, Parser)]
#[command(
    name = "kira-gmhi",
    version,
    about = "Gut Microbiome Health Index (GMHI) from species abundance tables"
)]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score samples with a bundled, supplied, or previously fitted signature.
    Score(ScoreArgs),
    /// Derive a signature and calibration constants from a labeled cohort.
    Fit(FitArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrientationArg {
    Auto,
    TaxaBySample,
    SampleByTaxa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Auto,
    Frequency,
    RelativeFrequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Tsv,
    Csv,
}

#[derive(Debug, Clone, Args)]
struct TableArgs {
    /// Abundance table (.tsv/.csv, optionally .gz).
    #[arg(long)]
    table: PathBuf,

    #[arg(long, value_enum, default_value_t = OrientationArg::Auto)]
    orientation: OrientationArg,

    #[arg(long, value_enum, default_value_t = KindArg::Auto)]
    table_kind: KindArg,

    #[arg(long, default_value_t = 1e-5)]
    relative_threshold: f64,

    #[arg(long, default_value_t = 1e-5)]
    log_threshold: f64,

    /// Taxa whose identifier matches this regex are dropped before renormalization.
    #[arg(long, default_value = DEFAULT_EXCLUDE_PATTERN)]
    exclude_pattern: String,

    #[arg(long)]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = FormatArg::Tsv)]
    format: FormatArg,
}

#[derive(Debug, Clone, Args)]
struct CohortArgs {
    /// Sample metadata (TSV, first column or `sample-id` column holds ids).
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Boolean or 0/1 column; true/1 marks healthy samples.
    #[arg(long, conflicts_with = "healthy_column")]
    label_column: Option<String>,

    #[arg(long, requires_all = ["healthy_states", "non_healthy_states"])]
    healthy_column: Option<String>,

    /// Comma-separated values of --healthy-column, or `rest`.
    #[arg(long)]
    healthy_states: Option<String>,

    /// Comma-separated values of --healthy-column, or `rest`.
    #[arg(long)]
    non_healthy_states: Option<String>,
}

impl CohortArgs {
    fn has_cohorts(&self) -> bool {
        self.label_column.is_some() || self.healthy_column.is_some()
    }
}

#[derive(Debug, Clone, Args)]
struct ScoreArgs {
    #[command(flatten)]
    table: TableArgs,

    #[arg(long)]
    healthy_species: Option<PathBuf>,

    #[arg(long)]
    non_healthy_species: Option<PathBuf>,

    #[arg(long, requires = "mn_prime", conflicts_with = "constants")]
    mh_prime: Option<f64>,

    #[arg(long, requires = "mh_prime", conflicts_with = "constants")]
    mn_prime: Option<f64>,

    /// constants.txt written by `fit`.
    #[arg(long)]
    constants: Option<PathBuf>,

    #[command(flatten)]
    cohorts: CohortArgs,
}

#[derive(Debug, Clone, Args)]
struct FitArgs {
    #[command(flatten)]
    table: TableArgs,

    #[command(flatten)]
    cohorts: CohortArgs,

    #[arg(long, default_value_t = 1.4)]
    theta_fold: f64,

    #[arg(long, default_value_t = 10.0)]
    theta_diff: f64,

    /// Also score the training table with the fitted signature.
    #[arg(long)]
    score: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    if let Err(err) = run(&cli) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Score(args) => run_score(args),
        Command::Fit(args) => run_fit(args),
    }
}

fn build_params(table: &TableArgs, theta_fold: f64, theta_diff: f64) -> Result<GmhiParams> {
    let params = GmhiParams {
        relative_threshold: table.relative_threshold,
        log_threshold: table.log_threshold,
        theta_fold,
        theta_diff,
        exclude_pattern: table.exclude_pattern.clone(),
    };
    params.validate()?;
    Ok(params)
}

fn table_options(args: &TableArgs) -> TableOptions {
    TableOptions {
        orientation: match args.orientation {
            OrientationArg::Auto => None,
            OrientationArg::TaxaBySample => Some(Orientation::TaxaBySample),
            OrientationArg::SampleByTaxa => Some(Orientation::SampleByTaxa),
        },
        kind: match args.table_kind {
            KindArg::Auto => None,
            KindArg::Frequency => Some(TableKind::Frequency),
            KindArg::RelativeFrequency => Some(TableKind::RelativeFrequency),
        },
    }
}

fn table_format(format: FormatArg) -> TableFormat {
    match format {
        FormatArg::Tsv => TableFormat::Tsv,
        FormatArg::Csv => TableFormat::Csv,
    }
}

fn prepare_profile(args: &TableArgs, params: &GmhiParams) -> Result<Stage2Output> {
    let table = load_abundance_table(&args.table, table_options(args))?;
    normalize(table, params, &TotalSumScaling)
}

fn load_checked_metadata(path: &Path, sample_ids: &[String]) -> Result<SampleMetadata> {
    let meta = load_meta(path)?;
    validate_metadata_is_superset(&meta, sample_ids)?;
    Ok(meta)
}

fn resolve_labels(
    cohorts: &CohortArgs,
    meta: &SampleMetadata,
    sample_ids: &[String],
) -> Result<CohortLabels> {
    if let Some(column) = &cohorts.label_column {
        return binary_labels(meta, column, sample_ids);
    }
    match (
        &cohorts.healthy_column,
        &cohorts.healthy_states,
        &cohorts.non_healthy_states,
    ) {
        (Some(column), Some(healthy), Some(non_healthy)) => {
            let states = resolve_cohort_states(meta, column, healthy, non_healthy)?;
            info!(
                "cohort states on '{}': healthy=[{}], non-healthy=[{}]",
                states.column,
                states.healthy.join(","),
                states.non_healthy.join(",")
            );
            labels_from_states(meta, &states, sample_ids)
        }
        _ => Err(GmhiError::InvalidParameter(
            "cohorts need --label-column, or --healthy-column with --healthy-states and --non-healthy-states"
                .to_string(),
        )),
    }
}

fn run_score(args: &ScoreArgs) -> Result<()> {
    let defaults = GmhiParams::default_v1();
    let params = build_params(&args.table, defaults.theta_fold, defaults.theta_diff)?;
    let signature = load_signature(
        args.healthy_species.as_deref(),
        args.non_healthy_species.as_deref(),
    )?;
    let stage2 = prepare_profile(&args.table, &params)?;
    let profile = &stage2.profile;

    let metadata = match &args.cohorts.metadata {
        Some(path) => Some(load_checked_metadata(path, &profile.sample_ids)?),
        None => None,
    };

    let (constants, calibration_source) = match (args.mh_prime, args.mn_prime, &args.constants) {
        (Some(mh), Some(mn), _) => (CalibrationConstants::new(mh, mn)?, "parameters".to_string()),
        (_, _, Some(path)) => (
            read_constants(path)?,
            format!("file:{}", path.display()),
        ),
        _ => match &metadata {
            Some(meta) if args.cohorts.has_cohorts() => {
                let labels = resolve_labels(&args.cohorts, meta, &profile.sample_ids)?;
                (
                    calibrate(profile, &signature, &labels)?,
                    "cohorts".to_string(),
                )
            }
            _ => {
                return Err(GmhiError::InvalidParameter(
                    "no calibration: pass --mh-prime and --mn-prime, --constants, or --metadata with cohort columns"
                        .to_string(),
                ));
            }
        },
    };

    let scored = score(profile, &signature, &constants, params.log_threshold)?;
    let out_dir = &args.table.out;
    write_score_outputs(out_dir, &scored, table_format(args.table.format))?;
    let summary = build_summary(&SummaryInput {
        command: "score",
        table_path: &args.table.table,
        profile,
        audit: &stage2.audit,
        params: &params,
        signature: &signature,
        constants: &constants,
        calibration_source,
        scored: Some(&scored),
        fit: None,
    });
    write_summary_outputs(out_dir, &summary)?;
    info!("scored {} samples into {}", scored.result.len(), out_dir.display());
    Ok(())
}

fn run_fit(args: &FitArgs) -> Result<()> {
    let params = build_params(&args.table, args.theta_fold, args.theta_diff)?;
    let stage2 = prepare_profile(&args.table, &params)?;
    let profile = &stage2.profile;

    let meta_path = args.cohorts.metadata.as_deref().ok_or_else(|| {
        GmhiError::InvalidParameter("fit requires --metadata".to_string())
    })?;
    let meta = load_checked_metadata(meta_path, &profile.sample_ids)?;
    let labels = resolve_labels(&args.cohorts, &meta, &profile.sample_ids)?;

    let fitted = fit(profile, &labels, params.theta_fold, params.theta_diff)?;
    let out_dir = &args.table.out;
    write_fit_outputs(out_dir, &fitted)?;

    let scored = if args.score {
        let scored = score(
            profile,
            &fitted.signature,
            &fitted.constants,
            params.log_threshold,
        )?;
        write_score_outputs(out_dir, &scored, table_format(args.table.format))?;
        Some(scored)
    } else {
        None
    };

    let summary = build_summary(&SummaryInput {
        command: "fit",
        table_path: &args.table.table,
        profile,
        audit: &stage2.audit,
        params: &params,
        signature: &fitted.signature,
        constants: &fitted.constants,
        calibration_source: "fitted".to_string(),
        scored: scored.as_ref(),
        fit: Some(&fitted),
    });
    write_summary_outputs(out_dir, &summary)?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
