//! Sort command implementation.
//!
//! Sort order (matches `LC_ALL=C sort -k1,1 -k2,2n`):
//! 1. Primary: chromosome (lexicographic, byte order)
//! 2. Secondary: start coordinate (ascending, numeric)
//! 3. Ties: input order preserved (stable sort)
//!
//! This is the order the overlap counter and the stratified rewrite require.
//! Keys are parsed once per line, so comparisons never re-parse or allocate.

use crate::bed::{BedError, Result};
use crate::streaming::output::write_atomically;
use crate::streaming::parsing::{parse_bed_key, should_skip_line, trim_newline};
use crate::streaming::BedWriter;
use log::info;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// A bed line with its pre-computed sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyedLine {
    line: String,
    chrom_len: usize,
    start: u64,
}

impl KeyedLine {
    #[inline]
    fn chrom(&self) -> &[u8] {
        &self.line.as_bytes()[..self.chrom_len]
    }

    #[inline]
    fn cmp_key(&self, other: &Self) -> Ordering {
        self.chrom()
            .cmp(other.chrom())
            .then(self.start.cmp(&other.start))
    }
}

/// Sort command configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortCommand;

impl SortCommand {
    pub fn new() -> Self {
        Self
    }

    /// Sort bed lines. Header, comment and blank lines are dropped.
    ///
    /// `source_name` is used in error messages only.
    pub fn sort_lines<I>(&self, lines: I, source_name: &str) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = std::io::Result<String>>,
    {
        let mut keyed = Vec::new();
        for (idx, line) in lines.into_iter().enumerate() {
            let mut line = line?;
            let trimmed_len = trim_newline(&line).len();
            line.truncate(trimmed_len);
            if should_skip_line(line.as_bytes()) {
                continue;
            }

            let (chrom_len, start) = match parse_bed_key(line.as_bytes()) {
                Some((chrom, start)) => (chrom.len(), start),
                None => {
                    return Err(BedError::MalformedRecord {
                        source_name: source_name.to_string(),
                        line: idx + 1,
                        message: "Expected a chromosome and a numeric start position".into(),
                    })
                }
            };
            keyed.push(KeyedLine {
                line,
                chrom_len,
                start,
            });
        }

        // Rayon's par_sort_by is stable, so ties keep input order.
        keyed.par_sort_by(|a, b| a.cmp_key(b));
        Ok(keyed.into_iter().map(|k| k.line).collect())
    }

    /// Sort bed data from `input` and write it to `output`.
    pub fn run<R: Read, W: Write>(&self, input: R, output: W, source_name: &str) -> Result<usize> {
        let sorted = self.sort_lines(BufReader::new(input).lines(), source_name)?;
        let mut writer = BedWriter::new(output);
        for line in &sorted {
            writer.write_line(line.as_bytes())?;
        }
        writer.flush()?;
        Ok(sorted.len())
    }

    /// Sort a file, replacing it atomically with the sorted version.
    pub fn sort_file_in_place<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        info!("Sorting {}", path.display());

        let source_name = path.display().to_string();
        let input = File::open(path)?;
        let sorted = self.sort_lines(BufReader::new(input).lines(), &source_name)?;

        write_atomically(path, |file| {
            let mut writer = BedWriter::new(file);
            for line in &sorted {
                writer.write_line(line.as_bytes())?;
            }
            writer.flush()?;
            Ok(sorted.len())
        })
    }
}
