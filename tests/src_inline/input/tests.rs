use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::constants::{parse_constants, read_constants, render_constants};
use super::{TableOptions, delimiter_for, detect_orientation, load_abundance_table};
use crate::error::GmhiError;
use crate::model::calibration::CalibrationConstants;
use crate::model::table::{Orientation, TableKind, detect_kind};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_gmhi_input_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, contents: &str) {
    let mut f = BufWriter::new(File::create(path).unwrap());
    f.write_all(contents.as_bytes()).unwrap();
}

fn write_gz(path: &Path, contents: &str) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    enc.write_all(contents.as_bytes()).unwrap();
    enc.finish().unwrap();
}

#[test]
fn test_taxa_by_sample_table() {
    let dir = make_temp_dir();
    let path = dir.join("abundance.tsv");
    write_file(
        &path,
        "#mpa_v30_CHOCOPhlAn_201901\nclade_name\tS1\tS2\ns__A\t60\t20\ns__B\t40\t80\n",
    );

    let table = load_abundance_table(&path, TableOptions::default()).unwrap();
    assert_eq!(table.sample_ids, vec!["S1", "S2"]);
    assert_eq!(table.taxon_ids, vec!["s__A", "s__B"]);
    assert_eq!(table.values, vec![vec![60.0, 40.0], vec![20.0, 80.0]]);
    assert_eq!(table.kind, TableKind::RelativeFrequency);
}

#[test]
fn test_sample_by_taxa_csv_gz() {
    let dir = make_temp_dir();
    let path = dir.join("counts.csv.gz");
    write_gz(&path, "sample-id,s__A,s__B\nS1,120,30\nS2,0,500\n");

    let table = load_abundance_table(&path, TableOptions::default()).unwrap();
    assert_eq!(table.sample_ids, vec!["S1", "S2"]);
    assert_eq!(table.taxon_ids, vec!["s__A", "s__B"]);
    assert_eq!(table.values[1], vec![0.0, 500.0]);
    assert_eq!(table.kind, TableKind::Frequency);
}

#[test]
fn test_merged_metaphlan_table_with_id_header() {
    let dir = make_temp_dir();
    let path = dir.join("merged_abundance_table.txt");
    write_file(
        &path,
        "ID\tS1\tS2\n\
k__Bacteria|p__Actinobacteria|s__Bifidobacterium_adolescentis\t60.0\t10.0\n\
k__Bacteria|p__Actinobacteria|s__Eggerthella_lenta\t40.0\t90.0\n",
    );

    let table = load_abundance_table(&path, TableOptions::default()).unwrap();
    assert_eq!(table.sample_ids, vec!["S1", "S2"]);
    assert_eq!(
        table.taxon_ids,
        vec![
            "k__Bacteria|p__Actinobacteria|s__Bifidobacterium_adolescentis",
            "k__Bacteria|p__Actinobacteria|s__Eggerthella_lenta"
        ]
    );
    assert_eq!(table.values[1], vec![10.0, 90.0]);
    assert_eq!(table.kind, TableKind::RelativeFrequency);
}

#[test]
fn test_biom_style_header_and_forced_options() {
    let dir = make_temp_dir();
    let path = dir.join("biom.tsv");
    write_file(
        &path,
        "# Constructed from biom file\n#OTU ID\tS1\tS2\ns__A\t1\t0\ns__B\t0\t1\n",
    );

    let table = load_abundance_table(
        &path,
        TableOptions {
            orientation: Some(Orientation::TaxaBySample),
            kind: Some(TableKind::Frequency),
        },
    )
    .unwrap();
    assert_eq!(table.sample_ids, vec!["S1", "S2"]);
    assert_eq!(table.kind, TableKind::Frequency);
}

#[test]
fn test_table_errors() {
    let dir = make_temp_dir();
    let missing = dir.join("nope.tsv");
    assert!(matches!(
        load_abundance_table(&missing, TableOptions::default()),
        Err(GmhiError::NotFound(_))
    ));

    let negative = dir.join("negative.tsv");
    write_file(&negative, "taxon\tS1\ns__A\t-1\n");
    let err = load_abundance_table(&negative, TableOptions::default()).unwrap_err();
    assert!(err.to_string().contains("non-negative"));

    let ragged = dir.join("ragged.tsv");
    write_file(&ragged, "taxon\tS1\tS2\ns__A\t1\n");
    let err = load_abundance_table(&ragged, TableOptions::default()).unwrap_err();
    assert!(err.to_string().contains("line 2 has 2 columns"));

    let dup = dir.join("dup.tsv");
    write_file(&dup, "taxon\tS1\tS1\ns__A\t1\t2\n");
    let err = load_abundance_table(&dup, TableOptions::default()).unwrap_err();
    assert!(err.to_string().contains("duplicate sample id 'S1'"));

    let header_only = dir.join("header_only.tsv");
    write_file(&header_only, "taxon\tS1\n");
    assert!(matches!(
        load_abundance_table(&header_only, TableOptions::default()),
        Err(GmhiError::Parse { .. })
    ));
}

#[test]
fn test_detect_orientation_and_delimiter() {
    let cells = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let plain = cells(&["A", "B"]);
    let samples = cells(&["S1", "S2"]);

    // Lineage-style labels decide first.
    assert_eq!(
        detect_orientation(&cells(&["ID", "S1", "S2"]), &cells(&["k__B|s__A", "k__B|s__C"])),
        Orientation::TaxaBySample
    );
    assert_eq!(
        detect_orientation(&cells(&["sample", "s__A", "s__B"]), &samples),
        Orientation::SampleByTaxa
    );
    assert_eq!(
        detect_orientation(&cells(&["#SampleID", "k__B;s__A"]), &cells(&["S1"])),
        Orientation::SampleByTaxa
    );

    // Otherwise the header cell.
    assert_eq!(
        detect_orientation(&cells(&["sample-id", "A", "B"]), &samples),
        Orientation::SampleByTaxa
    );
    assert_eq!(
        detect_orientation(&cells(&["#SampleID", "A", "B"]), &samples),
        Orientation::SampleByTaxa
    );
    assert_eq!(
        detect_orientation(&cells(&["ID", "S1", "S2"]), &plain),
        Orientation::TaxaBySample
    );
    assert_eq!(
        detect_orientation(&cells(&["clade_name", "S1", "S2"]), &plain),
        Orientation::TaxaBySample
    );
    assert_eq!(delimiter_for(Path::new("x.CSV")), ',');
    assert_eq!(delimiter_for(Path::new("x.csv.gz")), ',');
    assert_eq!(delimiter_for(Path::new("x.tsv.gz")), '\t');
}

#[test]
fn test_detect_kind() {
    assert_eq!(
        detect_kind(&[vec![0.5, 0.5], vec![0.2, 0.8]]),
        TableKind::RelativeFrequency
    );
    assert_eq!(
        detect_kind(&[vec![60.0, 40.0], vec![100.0, 0.0]]),
        TableKind::RelativeFrequency
    );
    assert_eq!(detect_kind(&[vec![3.0, 200.0]]), TableKind::Frequency);
    assert_eq!(detect_kind(&[vec![3.5, 200.0]]), TableKind::RelativeFrequency);
}

#[test]
fn test_constants_file() {
    let dir = make_temp_dir();
    let path = dir.join("constants.txt");
    let constants = CalibrationConstants {
        mh_prime: 7.0,
        mn_prime: 31.5,
    };
    write_file(&path, &render_constants(&constants));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "H_constant: 7\nNH_constant: 31.5\n"
    );
    assert_eq!(read_constants(&path).unwrap(), constants);

    let zero = dir.join("zero.txt");
    write_file(&zero, "H_constant: 0\nNH_constant: 2\n");
    assert!(matches!(
        read_constants(&zero),
        Err(GmhiError::InvalidCalibration { name: "mh_prime", .. })
    ));

    assert!(parse_constants(&path, "H_constant: 1\n").is_err());
    assert!(parse_constants(&path, "H_constant: x\nNH_constant: 1\n").is_err());
}
