//! Kucab et al. mutation compendium converter.
//!
//! Converts the compendium's substitution table (`*final.txt`) into a sorted
//! trinucleotide-context bed file, keeping only substitutions attributed to
//! polycyclic aromatic hydrocarbon (PAH) mutagens.

use crate::bed::{BedError, Result};
use crate::commands::sort::SortCommand;
use crate::discover::{isolated_parent_dir, parent_dir};
use crate::sequence::{is_purine, reverse_complement};
use crate::streaming::output::write_atomically;
use crate::streaming::parsing::{parse_u64_fast, tab_fields, trim_newline};
use crate::streaming::BedWriter;
use log::info;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Required suffix of compendium substitution files.
pub const INPUT_SUFFIX: &str = "final.txt";

/// Mutagen designations of all PAH signatures.
pub const ALL_PAH_DESIGNATIONS: &[&str] = &[
    "MSM0.54", "MSM0.26", "MSM0.92", "MSM0.2", "MSM0.42", "MSM0.74", "MSM0.103", "MSM0.14",
    "MSM0.82", "MSM0.130", "MSM0.12", "MSM0.132", "MSM0.13", "MSM0.96",
];

/// Designations whose signature mimics smokers' lung cancer tumors.
pub const SMOKER_LUNG_DESIGNATIONS: &[&str] =
    &["MSM0.26", "MSM0.92", "MSM0.2", "MSM0.103", "MSM0.14"];

// Column indices in the compendium table.
const CHROM_COL: usize = 4;
const POSITION_COL: usize = 5;
const REF_COL: usize = 6;
const ALT_COL: usize = 7;
const PRE_BASE_COL: usize = 13;
const POST_BASE_COL: usize = 14;
const DESIGNATION_COL: usize = 15;
const MIN_FIELDS: usize = DESIGNATION_COL + 1;

/// Kucab compendium conversion configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct KucabCommand {
    /// Keep every PAH designation instead of only the smoker-lung subset.
    pub include_all_pahs: bool,
}

impl KucabCommand {
    pub fn new(include_all_pahs: bool) -> Self {
        Self { include_all_pahs }
    }

    fn designations(&self) -> FxHashSet<&'static str> {
        let list = if self.include_all_pahs {
            ALL_PAH_DESIGNATIONS
        } else {
            SMOKER_LUNG_DESIGNATIONS
        };
        list.iter().copied().collect()
    }

    fn group_suffix(&self) -> &'static str {
        if self.include_all_pahs {
            "all_PAHs"
        } else {
            "smoker_lung"
        }
    }

    /// `<dir>/<dir name>_<group>_trinuc_context.bed` for an input file.
    pub fn output_path(&self, input: &Path) -> Result<PathBuf> {
        let dir = parent_dir(input)?;
        let name = isolated_parent_dir(input)?;
        Ok(dir.join(format!("{}_{}_trinuc_context.bed", name, self.group_suffix())))
    }

    /// Convert compendium rows into trinuc-context bed rows.
    ///
    /// The first line is a header. Returns the number of rows written.
    pub fn convert<R: BufRead, W: Write>(&self, input: R, output: W, source_name: &str) -> Result<usize> {
        let designations = self.designations();
        let mut writer = BedWriter::new(output);
        let mut itoa_buf = itoa::Buffer::new();
        let mut written = 0;

        for (idx, line) in input.lines().enumerate().skip(1) {
            let line = line?;
            let line = trim_newline(&line);
            if line.is_empty() {
                continue;
            }
            let malformed = |message: String| BedError::MalformedRecord {
                source_name: source_name.to_string(),
                line: idx + 1,
                message,
            };

            let fields: Vec<&[u8]> = tab_fields(line.as_bytes()).collect();
            if fields.len() < MIN_FIELDS {
                return Err(malformed(format!(
                    "Expected at least {} tab-delimited fields, got {}",
                    MIN_FIELDS,
                    fields.len()
                )));
            }

            let designation = String::from_utf8_lossy(fields[DESIGNATION_COL]);
            if !designations.contains(designation.as_ref()) {
                continue;
            }

            let position = match parse_u64_fast(fields[POSITION_COL]) {
                Some(p) if p > 0 => p,
                _ => {
                    return Err(malformed(format!(
                        "Invalid 1-based position: '{}'",
                        String::from_utf8_lossy(fields[POSITION_COL])
                    )))
                }
            };

            let chrom = format!("chr{}", String::from_utf8_lossy(fields[CHROM_COL]));
            let mutated_from = String::from_utf8_lossy(fields[REF_COL]);
            let mutated_to = String::from_utf8_lossy(fields[ALT_COL]);
            let context = format!(
                "{}{}{}",
                String::from_utf8_lossy(fields[PRE_BASE_COL]),
                mutated_from,
                String::from_utf8_lossy(fields[POST_BASE_COL])
            );

            // Substitutions are reported from the pyrimidine of the base pair.
            let (context, mutation, strand) = if is_purine(&mutated_from) {
                (
                    reverse_complement(&context),
                    format!(
                        "{}>{}",
                        reverse_complement(&mutated_from),
                        reverse_complement(&mutated_to)
                    ),
                    "-",
                )
            } else {
                (context, format!("{}>{}", mutated_from, mutated_to), "+")
            };

            let start = itoa_buf.format(position - 1).to_string();
            writer.write_fields(&[
                chrom.as_bytes(),
                start.as_bytes(),
                itoa_buf.format(position).as_bytes(),
                context.as_bytes(),
                mutation.as_bytes(),
                strand.as_bytes(),
            ])?;
            written += 1;
        }

        writer.flush()?;
        Ok(written)
    }

    /// Convert one compendium file and sort the result. Returns the output path.
    pub fn run(&self, input: &Path) -> Result<PathBuf> {
        info!("Working in {}", input.display());
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !file_name.ends_with(INPUT_SUFFIX) {
            return Err(BedError::InputShape(format!(
                "expected a Kucab compendium file ending in \"{}\", got '{}'",
                INPUT_SUFFIX,
                input.display()
            )));
        }

        let output_path = self.output_path(input)?;
        let source_name = input.display().to_string();
        info!("Reading data and writing to {}", output_path.display());
        let rows = write_atomically(&output_path, |file| {
            let reader = BufReader::new(File::open(input)?);
            self.convert(reader, file, &source_name)
        })?;
        info!("Wrote {} substitutions", rows);

        SortCommand::new().sort_file_in_place(&output_path)?;
        Ok(output_path)
    }

    /// Convert several files in parallel.
    pub fn run_all<P: AsRef<Path> + Sync>(&self, inputs: &[P]) -> Result<Vec<PathBuf>> {
        inputs.par_iter().map(|p| self.run(p.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn row(chrom: &str, pos: &str, from: &str, to: &str, pre: &str, post: &str, msm: &str) -> String {
        let mut fields = vec!["x"; MIN_FIELDS];
        fields[CHROM_COL] = chrom;
        fields[POSITION_COL] = pos;
        fields[REF_COL] = from;
        fields[ALT_COL] = to;
        fields[PRE_BASE_COL] = pre;
        fields[POST_BASE_COL] = post;
        fields[DESIGNATION_COL] = msm;
        fields.join("\t")
    }

    fn table(rows: &[String]) -> String {
        let mut content = String::from("header\n");
        for r in rows {
            content.push_str(r);
            content.push('\n');
        }
        content
    }

    fn convert(cmd: KucabCommand, content: &str) -> Result<String> {
        let mut output = Vec::new();
        cmd.convert(content.as_bytes(), &mut output, "<test>")?;
        Ok(String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_pyrimidine_reference_stays_on_plus() {
        let content = table(&[row("1", "100", "C", "T", "A", "G", "MSM0.26")]);
        let out = convert(KucabCommand::new(false), &content).unwrap();
        assert_eq!(out, "chr1\t99\t100\tACG\tC>T\t+\n");
    }

    #[test]
    fn test_purine_reference_is_flipped() {
        let content = table(&[row("X", "10", "G", "T", "C", "A", "MSM0.92")]);
        let out = convert(KucabCommand::new(false), &content).unwrap();
        // CGA reverse complemented is TCG; G>T becomes C>A.
        assert_eq!(out, "chrX\t9\t10\tTCG\tC>A\t-\n");
    }

    #[test]
    fn test_designation_filter() {
        let content = table(&[
            row("1", "5", "C", "A", "T", "T", "MSM0.54"),
            row("1", "6", "C", "A", "T", "T", "MSM0.14"),
            row("1", "7", "C", "A", "T", "T", "MSM0.999"),
        ]);

        let lung = convert(KucabCommand::new(false), &content).unwrap();
        assert_eq!(lung.lines().count(), 1);

        let all = convert(KucabCommand::new(true), &content).unwrap();
        assert_eq!(all.lines().count(), 2);
    }

    #[test]
    fn test_short_row_is_malformed() {
        let content = "header\n1\t2\t3\n";
        let err = convert(KucabCommand::new(false), content).unwrap_err();
        assert!(matches!(err, BedError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_zero_position_is_malformed() {
        let content = table(&[row("1", "0", "C", "T", "A", "G", "MSM0.26")]);
        assert!(convert(KucabCommand::new(false), &content).is_err());
    }

    #[test]
    fn test_run_rejects_wrong_suffix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subs.tsv");
        fs::write(&path, "header\n").unwrap();
        let err = KucabCommand::new(false).run(&path).unwrap_err();
        assert!(matches!(err, BedError::InputShape(_)));
    }

    #[test]
    fn test_run_writes_sorted_output() {
        let root = tempdir().unwrap();
        let group = root.path().join("Kucab");
        fs::create_dir(&group).unwrap();
        let input = group.join("denovo_subclone_subs_final.txt");
        fs::write(
            &input,
            table(&[
                row("2", "50", "C", "T", "A", "A", "MSM0.26"),
                row("1", "70", "T", "G", "A", "A", "MSM0.2"),
                row("1", "8", "A", "G", "C", "C", "MSM0.2"),
            ]),
        )
        .unwrap();

        let output = KucabCommand::new(false).run(&input).unwrap();
        assert_eq!(output, group.join("Kucab_smoker_lung_trinuc_context.bed"));
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "chr1\t7\t8\tGTG\tT>C\t-\nchr1\t69\t70\tATA\tT>G\t+\nchr2\t49\t50\tACA\tC>T\t+\n"
        );
    }
}
