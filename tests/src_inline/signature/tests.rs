use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::defs::default_species;
use super::loader::{load_signature, parse_species_lines};
use super::SignatureSource;
use crate::error::{GmhiError, Side};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_gmhi_signature_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, contents: &str) {
    let mut f = BufWriter::new(File::create(path).unwrap());
    f.write_all(contents.as_bytes()).unwrap();
}

fn defaults(side: Side) -> Vec<String> {
    default_species(side).iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_load_defaults() {
    let sig = load_signature(None, None).unwrap();
    assert_eq!(sig.healthy.species, defaults(Side::Healthy));
    assert_eq!(sig.non_healthy.species, defaults(Side::NonHealthy));
    assert_eq!(sig.healthy.source, SignatureSource::Default);
    assert_eq!(sig.healthy.side, Side::Healthy);
    assert_eq!(sig.non_healthy.side, Side::NonHealthy);
    assert_eq!(sig.healthy.len(), 7);
    assert_eq!(sig.non_healthy.len(), 43);
    assert!(sig.overlap().is_empty());
}

#[test]
fn test_load_healthy_file_keeps_default_non_healthy() {
    let dir = make_temp_dir();
    let path = dir.join("fake_MH_species.txt");
    write_file(&path, "s__fake_1\n  s__fake_2  \n");

    let sig = load_signature(Some(&path), None).unwrap();
    assert_eq!(sig.healthy.species, vec!["s__fake_1", "s__fake_2"]);
    assert_eq!(sig.healthy.source, SignatureSource::File(path.clone()));
    assert_eq!(sig.non_healthy.species, defaults(Side::NonHealthy));
}

#[test]
fn test_load_both_files() {
    let dir = make_temp_dir();
    let mh = dir.join("mh.txt");
    let mn = dir.join("mn.txt");
    write_file(&mh, "s__fake_1\ns__fake_2\n");
    write_file(&mn, "s__fake_non_1\ns__fake_non_2\ns__fake_non_3\n");

    let sig = load_signature(Some(&mh), Some(&mn)).unwrap();
    assert_eq!(sig.healthy.species, vec!["s__fake_1", "s__fake_2"]);
    assert_eq!(
        sig.non_healthy.species,
        vec!["s__fake_non_1", "s__fake_non_2", "s__fake_non_3"]
    );
    assert!(sig.non_healthy.contains("s__fake_non_2"));
    assert!(!sig.healthy.contains("s__fake_non_2"));
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = make_temp_dir();
    let path = dir.join("do-not-exists.txt");
    let err = load_signature(Some(&path), None).unwrap_err();
    assert!(matches!(err, GmhiError::NotFound(_)));
    assert!(err.to_string().contains("No such file or directory"));

    let err = load_signature(None, Some(&path)).unwrap_err();
    assert!(matches!(err, GmhiError::NotFound(_)));
}

#[test]
fn test_empty_file_reports_side() {
    let dir = make_temp_dir();
    let path = dir.join("empty_species.txt");
    write_file(&path, "");

    let err = load_signature(Some(&path), None).unwrap_err();
    assert!(matches!(err, GmhiError::EmptySignature(Side::Healthy)));
    assert_eq!(err.to_string(), "Healthy species list is empty!");

    let err = load_signature(None, Some(&path)).unwrap_err();
    assert!(matches!(err, GmhiError::EmptySignature(Side::NonHealthy)));
    assert_eq!(err.to_string(), "Non-healthy species list is empty!");
}

#[test]
fn test_whitespace_only_file_is_empty() {
    let dir = make_temp_dir();
    let path = dir.join("blank.txt");
    write_file(&path, "  \n\t\n\n");
    let err = load_signature(Some(&path), None).unwrap_err();
    assert!(matches!(err, GmhiError::EmptySignature(Side::Healthy)));
}

#[test]
fn test_species_lines_reduce_lineages_and_dedup() {
    let parsed = parse_species_lines(
        "k__Bacteria;p__Firmicutes;s__A\nk__Bacteria|g__B|s__B \ns__A\r\n\n",
    );
    assert_eq!(parsed, vec!["s__A", "s__B"]);
}

#[test]
fn test_blank_species_lines_are_dropped() {
    assert_eq!(parse_species_lines("s__a\n   \ns__b\n"), vec!["s__a", "s__b"]);
    assert!(parse_species_lines(" \n\t\n").is_empty());
}
