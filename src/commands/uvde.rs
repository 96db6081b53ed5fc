//! UVDE-seq lesion converter.
//!
//! UVDE-seq reports each UV lesion as a 2 bp dinucleotide. Each one is split
//! into two single-base lesions so downstream counting works per nucleotide.

use crate::bed::{BedError, Result};
use crate::commands::sort::SortCommand;
use crate::discover::{isolated_parent_dir, parent_dir};
use crate::streaming::output::write_atomically;
use crate::streaming::parsing::{parse_u64_fast, should_skip_line, tab_fields, trim_newline};
use crate::streaming::BedWriter;
use log::info;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Required suffix of UVDE-seq input files.
pub const INPUT_SUFFIX: &str = ".bed";

const MIN_FIELDS: usize = 6;
const STRAND_COL: usize = 5;

/// UVDE-seq conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct UvdeCommand;

impl UvdeCommand {
    pub fn new() -> Self {
        Self
    }

    /// `<dir>/<dir name>_singlenuc_context.bed` for an input file.
    pub fn output_path(&self, input: &Path) -> Result<PathBuf> {
        let dir = parent_dir(input)?;
        let name = isolated_parent_dir(input)?;
        Ok(dir.join(format!("{}_singlenuc_context.bed", name)))
    }

    /// Split every 2 bp lesion into two single-base lesions.
    ///
    /// Returns the number of rows written.
    pub fn convert<R: BufRead, W: Write>(&self, input: R, output: W, source_name: &str) -> Result<usize> {
        let mut writer = BedWriter::new(output);
        let mut written = 0;

        for (idx, line) in input.lines().enumerate() {
            let line = line?;
            let line = trim_newline(&line);
            if should_skip_line(line.as_bytes()) {
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

            let chrom = String::from_utf8_lossy(fields[0]);
            let start = parse_u64_fast(fields[1]);
            let end = parse_u64_fast(fields[2]);
            let (start, end) = match (start, end) {
                (Some(s), Some(e)) if e > s => (s, e),
                _ => return Err(malformed("Invalid lesion coordinates".into())),
            };
            let strand = String::from_utf8_lossy(fields[STRAND_COL]);

            // Inclusive end of the first base's window.
            let last = end - 1;
            for i in 0..2 {
                let base_start = (start + i).to_string();
                let base_end = (last + i).to_string();
                let id = format!("{}:{}-{}({})", chrom, base_start, base_end, strand);
                writer.write_fields(&[
                    chrom.as_bytes(),
                    base_start.as_bytes(),
                    base_end.as_bytes(),
                    id.as_bytes(),
                    b"NA",
                    strand.as_bytes(),
                ])?;
                written += 1;
            }
        }

        writer.flush()?;
        Ok(written)
    }

    /// Convert one UVDE-seq file and sort the result. Returns the output path.
    pub fn run(&self, input: &Path) -> Result<PathBuf> {
        info!("Working in {}", input.display());
        let is_bed = input
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(INPUT_SUFFIX))
            .unwrap_or(false);
        if !is_bed {
            return Err(BedError::InputShape(format!(
                "expected bed file format, got '{}'",
                input.display()
            )));
        }

        let output_path = self.output_path(input)?;
        let source_name = input.display().to_string();
        info!("Converting 2-bp lesions to single base lesions");
        let rows = write_atomically(&output_path, |file| {
            let reader = BufReader::new(File::open(input)?);
            self.convert(reader, file, &source_name)
        })?;
        info!("Wrote {} single base lesions", rows);

        SortCommand::new().sort_file_in_place(&output_path)?;
        Ok(output_path)
    }

    /// Convert several files in parallel.
    pub fn run_all<P: AsRef<Path> + Sync>(&self, inputs: &[P]) -> Result<Vec<PathBuf>> {
        inputs.par_iter().map(|p| self.run(p.as_ref())).collect()
    }
}
