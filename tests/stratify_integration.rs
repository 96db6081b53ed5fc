//! End-to-end tests for nucleosome map stratification.
//!
//! Tests verify:
//! 1. Stratified maps keep exactly the dyads inside feature ranges, verbatim
//! 2. Counts tables and provenance files land in the documented layout
//! 3. Malformed or unsorted input aborts without leaving partial output
//! 4. Converter output feeds straight into the overlap counter

use mutperiod::bed::BedError;
use mutperiod::commands::{
    read_counts_table, OverlapCountCommand, StratifyCommand, UvdeCommand,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const NUC_MAP: &str = "chr1\t90\t91\tnuc1\t.\t+\n\
                       chr1\t150\t151\tnuc2\t.\t+\n\
                       chr1\t150\t151\tnuc2r\t.\t-\n\
                       chr1\t400\t401\tnuc3\t.\t+\n\
                       chr2\t20\t21\tnuc4\t.\t-\n";

/// Base map directory `hg19_nuc_map/hg19_nuc_map.bed` inside a fresh root.
fn base_map(root: &TempDir, map: &str) -> PathBuf {
    let dir = root.path().join("hg19_nuc_map");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("hg19_nuc_map.bed"), map).unwrap();
    dir
}

/// Features file `<name>/<file>` inside the root.
fn features(root: &TempDir, name: &str, file: &str, content: &str) -> PathBuf {
    let dir = root.path().join(name);
    fs::create_dir(&dir).unwrap();
    let path = dir.join(file);
    fs::write(&path, content).unwrap();
    path
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_stratify_writes_map_counts_and_provenance() {
    let root = tempdir().unwrap();
    let base = base_map(&root, NUC_MAP);
    let peaks = features(&root, "hg19_nuc_map_peaks", "peaks.bed", "chr1\t100\t200\nchr1\t140\t160\n");

    let outcomes = StratifyCommand::new().run(&base, &[peaks.clone()]).unwrap();
    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.retained, 2);
    assert_eq!(outcome.stats.records_with_overlap, 2);

    let strat_dir = root.path().join("hg19_nuc_map_peaks");
    assert_eq!(
        read(&strat_dir.join("hg19_nuc_map_peaks.bed")),
        "chr1\t150\t151\tnuc2\t.\t+\nchr1\t150\t151\tnuc2r\t.\t-\n"
    );
    assert_eq!(
        read(&strat_dir.join("stratification_conditions.txt")),
        "Derived from the original nucleosome map: hg19_nuc_map.bed using peaks.bed.\n"
    );

    let counts_path = strat_dir
        .join("intermediate_files")
        .join("hg19_nuc_map_peaks_encompassment_counts.tsv");
    assert_eq!(
        read(&counts_path),
        "Nucleosome\tEncompassing_Feature_Counts\n\
         chr1:90(+)\t0\n\
         chr1:150(+)\t2\n\
         chr1:150(-)\t2\n\
         chr1:400(+)\t0\n\
         chr2:20(-)\t0\n"
    );

    let counts = read_counts_table(&counts_path).unwrap();
    assert_eq!(counts.len(), 5);
    assert_eq!(counts[1].count, 2);
}

#[test]
fn test_stratify_runs_independent_jobs() {
    let root = tempdir().unwrap();
    let base = base_map(&root, NUC_MAP);
    let chr2 = features(&root, "by_chr2", "chr2_features.bed", "chr2\t0\t100\n");
    let bounds = features(&root, "by_bounds", "edges.bed", "chr1\t90\t91\nchr1\t401\t500\n");

    let outcomes = StratifyCommand::new().run(&base, &[chr2, bounds]).unwrap();
    assert_eq!(outcomes.len(), 2);

    assert_eq!(
        read(&root.path().join("by_chr2").join("by_chr2.bed")),
        "chr2\t20\t21\tnuc4\t.\t-\n"
    );
    // Inclusive bounds: 90 is inside [90, 90]; 400 is one base before [401, 499].
    assert_eq!(
        read(&root.path().join("by_bounds").join("by_bounds.bed")),
        "chr1\t90\t91\tnuc1\t.\t+\n"
    );
}

#[test]
fn test_missing_strand_aborts_without_output() {
    let root = tempdir().unwrap();
    let broken = "chr1\t90\t91\tnuc1\t.\t+\nchr1\t150\t151\tnuc2\t.\n";
    let base = base_map(&root, broken);
    let peaks = features(&root, "strat", "peaks.bed", "chr1\t100\t200\n");

    let err = StratifyCommand::new().run(&base, &[peaks]).unwrap_err();
    assert!(matches!(err, BedError::MalformedRecord { line: 2, .. }));

    let strat_dir = root.path().join("strat");
    assert!(!strat_dir.join("strat.bed").exists());
    assert!(!strat_dir.join("stratification_conditions.txt").exists());
    assert!(!strat_dir
        .join("intermediate_files")
        .join("strat_encompassment_counts.tsv")
        .exists());
}

#[test]
fn test_unsorted_features_rejected() {
    let root = tempdir().unwrap();
    let base = base_map(&root, NUC_MAP);
    let peaks = features(&root, "strat", "peaks.bed", "chr2\t0\t10\nchr1\t100\t200\n");

    let err = StratifyCommand::new().run(&base, &[peaks.clone()]).unwrap_err();
    assert!(matches!(err, BedError::OrderingViolation(_)));

    // The inline check still fires when the pre-pass is skipped.
    let cmd = StratifyCommand {
        assume_sorted: true,
    };
    let err = cmd.run(&base, &[peaks]).unwrap_err();
    assert!(matches!(err, BedError::OrderingViolation(_)));
    assert!(!root.path().join("strat").join("strat.bed").exists());
}

#[test]
fn test_uvde_output_counts_against_features() {
    let root = tempdir().unwrap();
    let uvde_dir = root.path().join("UVDE_seq");
    fs::create_dir(&uvde_dir).unwrap();
    let lesions = uvde_dir.join("lesions.bed");
    fs::write(&lesions, "chr1\t199\t201\tr1\t0\t+\nchr1\t50\t52\tr2\t0\t-\n").unwrap();

    let singlenuc = UvdeCommand::new().run(&lesions).unwrap();
    let peaks = features(&root, "peaks", "peaks.bed", "chr1\t0\t200\n");

    let (counts, stats) = OverlapCountCommand::new()
        .count_files(&peaks, &singlenuc)
        .unwrap();
    assert_eq!(stats.encompassed_records, 4);
    let per_base: Vec<(u64, usize)> = counts.iter().map(|c| (c.id.position, c.count)).collect();
    assert_eq!(per_base, vec![(50, 1), (51, 1), (199, 1), (200, 0)]);
}
