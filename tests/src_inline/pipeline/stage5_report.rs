use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::error::Side;
use crate::input::constants::read_constants;
use crate::model::cohorts::{Cohort, CohortLabels};
use crate::pipeline::stage3_fit::fit;
use crate::pipeline::stage4_score::score;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_gmhi_report_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cohort_profile() -> (AbundanceProfile, CohortLabels) {
    let profile = AbundanceProfile {
        sample_ids: ["H1", "H2", "N1", "N2"].iter().map(|s| s.to_string()).collect(),
        taxon_ids: ["s__good", "s__bad", "s__common"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        values: vec![
            vec![0.5, 0.0, 0.5],
            vec![0.4, 0.0, 0.6],
            vec![0.0, 0.3, 0.7],
            vec![0.0, 0.2, 0.8],
        ],
    };
    let labels = CohortLabels {
        labels: vec![
            Cohort::Healthy,
            Cohort::Healthy,
            Cohort::NonHealthy,
            Cohort::NonHealthy,
        ],
    };
    (profile, labels)
}

#[test]
fn test_write_fit_outputs() {
    let dir = make_temp_dir();
    let (profile, labels) = cohort_profile();
    let fitted = fit(&profile, &labels, 1.4, 10.0).unwrap();
    write_fit_outputs(&dir, &fitted).unwrap();

    assert_eq!(
        fs::read_to_string(dir.join(HEALTHY_LIST_FILE)).unwrap(),
        "s__good\n"
    );
    assert_eq!(
        fs::read_to_string(dir.join(NON_HEALTHY_LIST_FILE)).unwrap(),
        "s__bad\n"
    );
    assert_eq!(read_constants(&dir.join(CONSTANTS_FILE)).unwrap(), fitted.constants);

    let prevalence = fs::read_to_string(dir.join(PREVALENCE_FILE)).unwrap();
    let lines: Vec<&str> = prevalence.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("taxon\tPH\tPNH"));
    assert!(lines[1].starts_with("s__good\t100\t0\t100\tinf"));
    assert!(lines[1].ends_with(Side::Healthy.label()));
    assert!(lines[3].ends_with("\t-"));
}

#[test]
fn test_write_score_outputs_tsv_and_csv() {
    let dir = make_temp_dir();
    let (profile, labels) = cohort_profile();
    let fitted = fit(&profile, &labels, 1.4, 10.0).unwrap();
    let scored = score(&profile, &fitted.signature, &fitted.constants, 1e-5).unwrap();

    let tsv = write_score_outputs(&dir, &scored, TableFormat::Tsv).unwrap();
    assert_eq!(tsv, dir.join("gmhi.tsv"));
    let content = fs::read_to_string(&tsv).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "sample-id\tGMHI");
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("H1\t"));

    let csv = write_score_outputs(&dir, &scored, TableFormat::Csv).unwrap();
    let content = fs::read_to_string(&csv).unwrap();
    assert!(content.starts_with("sample-id,GMHI\nH1,"));

    let details = fs::read_to_string(dir.join(DETAILS_FILE)).unwrap();
    assert!(details.lines().next().unwrap().starts_with("sample-id\tR_MH\tR_MN"));
    assert!(details.lines().nth(3).unwrap().starts_with("N1\t0\t1\t"));
}

#[test]
fn test_summary_outputs() {
    let dir = make_temp_dir();
    let (profile, labels) = cohort_profile();
    let fitted = fit(&profile, &labels, 1.4, 10.0).unwrap();
    let scored = score(&profile, &fitted.signature, &fitted.constants, 1e-5).unwrap();
    let audit = NormalizeAudit {
        n_taxa_raw: 4,
        excluded_taxa: vec!["s__unclassified".to_string()],
        ..NormalizeAudit::default()
    };
    let params = GmhiParams::default_v1();

    let summary = build_summary(&SummaryInput {
        command: "fit",
        table_path: Path::new("abundance.tsv"),
        profile: &profile,
        audit: &audit,
        params: &params,
        signature: &fitted.signature,
        constants: &fitted.constants,
        calibration_source: "fitted".to_string(),
        scored: Some(&scored),
        fit: Some(&fitted),
    });
    assert_eq!(summary.input.n_taxa_excluded, 1);
    assert_eq!(summary.signature.healthy.present_in_table, Some(1));
    write_summary_outputs(&dir, &summary).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap()).unwrap();
    assert_eq!(json["command"], "fit");
    assert_eq!(json["input"]["n_samples"], 4);
    assert_eq!(json["calibration"]["mh_prime"], 1.0);
    assert_eq!(json["fit"]["healthy_species"][0], "s__good");
    assert_eq!(json["gmhi"]["positive_fraction"], 0.5);

    let report = fs::read_to_string(dir.join(REPORT_FILE)).unwrap();
    assert!(report.contains("Calibration (fitted)"));
    assert!(report.contains("cohorts: 2 healthy, 2 non-healthy"));
}

#[test]
fn test_write_species_list() {
    let dir = make_temp_dir();
    let list = SpeciesList::new(
        Side::Healthy,
        crate::signature::SignatureSource::Fitted,
        vec!["s__A".to_string(), "s__B".to_string()],
    );
    let path = dir.join("list.txt");
    write_species_list(&path, &list).unwrap();
    let parsed = crate::signature::loader::read_species_file(&path).unwrap();
    assert_eq!(parsed, list.species);
}
