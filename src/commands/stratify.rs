//! Nucleosome map stratification.
//!
//! A nucleosome map is narrowed to the nucleosomes whose dyads fall inside a
//! set of feature ranges: the features are counted against the map with the
//! overlap counter, then the original map lines of every dyad with a nonzero
//! count are copied into a new map next to the features file.
//!
//! Directory layout, for a base map directory `B` and a features file in `S`:
//!
//! ```text
//! B/B.bed                                      original map
//! S/S.bed                                      stratified map
//! S/stratification_conditions.txt              provenance
//! S/intermediate_files/S_encompassment_counts.tsv
//! ```

use crate::bed::{BedError, BedReader, Result};
use crate::commands::overlap_count::{OverlapCount, OverlapCountCommand, OverlapCountStats};
use crate::discover::{dir_name, parent_dir};
use crate::interval::{PositionId, PositionRecord};
use crate::streaming::parsing::{tab_fields, trim_newline};
use crate::streaming::output::write_atomically;
use crate::streaming::BedWriter;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Header of the identity column in nucleosome counts tables.
pub const NUCLEOSOME_LABEL: &str = "Nucleosome";

/// File name of the provenance record.
pub const CONDITIONS_FILE: &str = "stratification_conditions.txt";

/// Name of the directory holding intermediate counts tables.
pub const INTERMEDIATE_DIR: &str = "intermediate_files";

/// Copies the original lines of retained records, in order.
///
/// Both the retained identities and the original file must share the same
/// sort order, so a single forward cursor over the original file suffices.
#[derive(Debug, Clone, Copy, Default)]
pub struct StratifiedRewriter;

impl StratifiedRewriter {
    pub fn new() -> Self {
        Self
    }

    /// Write the original line of every retained identity to `output`.
    ///
    /// Returns the number of lines written. Fails with `MatchNotFound` if the
    /// original records run out before an identity is found.
    pub fn rewrite<'a, O, I, W>(&self, original: O, retained: I, output: W) -> Result<usize>
    where
        O: IntoIterator<Item = Result<PositionRecord>>,
        I: IntoIterator<Item = &'a PositionId>,
        W: Write,
    {
        let mut original = original.into_iter();
        let mut writer = BedWriter::new(output);
        let mut written = 0;

        'retained: for id in retained {
            for record in original.by_ref() {
                let record = record?;
                if record.id == *id {
                    writer.write_line(record.raw_line.as_bytes())?;
                    written += 1;
                    continue 'retained;
                }
            }
            return Err(BedError::MatchNotFound(format!(
                "no record for {} before the end of the original map",
                id
            )));
        }

        writer.flush()?;
        Ok(written)
    }

    /// Rewrite from in-memory counts, keeping entries with a nonzero count.
    pub fn rewrite_counts<O, W>(&self, original: O, counts: &[OverlapCount], output: W) -> Result<usize>
    where
        O: IntoIterator<Item = Result<PositionRecord>>,
        W: Write,
    {
        self.rewrite(original, retained_ids(counts), output)
    }
}

/// Identities with a nonzero count, in input order.
pub fn retained_ids(counts: &[OverlapCount]) -> impl Iterator<Item = &PositionId> {
    counts.iter().filter(|c| c.count > 0).map(|c| &c.id)
}

/// Read a counts table written by [`OverlapCountCommand::write_table`].
pub fn read_counts_table<P: AsRef<Path>>(path: P) -> Result<Vec<OverlapCount>> {
    let path = path.as_ref();
    let source_name = path.display().to_string();
    let reader = BufReader::new(File::open(path)?);
    let malformed = |line: usize, message: String| BedError::MalformedRecord {
        source_name: source_name.clone(),
        line,
        message,
    };

    let mut counts = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = trim_newline(&line);
        // First line is the header.
        if idx == 0 || line.is_empty() {
            continue;
        }

        let mut fields = tab_fields(line.as_bytes());
        let (id, count) = match (fields.next(), fields.next()) {
            (Some(id), Some(count)) => (id, count),
            _ => return Err(malformed(idx + 1, "Expected identity and count columns".into())),
        };
        let id: PositionId = String::from_utf8_lossy(id)
            .parse()
            .map_err(|e: crate::interval::ParsePositionIdError| malformed(idx + 1, e.to_string()))?;
        let count = crate::streaming::parse_u64_fast(count)
            .ok_or_else(|| malformed(idx + 1, "Invalid count".into()))?;

        counts.push(OverlapCount::new(id, count as usize));
    }
    Ok(counts)
}

/// Write the provenance line naming the source map and the features file.
pub fn write_provenance<W: Write>(mut output: W, original_map: &Path, features: &Path) -> Result<()> {
    writeln!(
        output,
        "Derived from the original nucleosome map: {} using {}.",
        file_name(original_map),
        file_name(features)
    )?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Paths involved in stratifying one base map by one features file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratificationJob {
    pub original_map: PathBuf,
    pub features: PathBuf,
    pub stratified_map: PathBuf,
    pub conditions: PathBuf,
    pub counts_table: PathBuf,
}

impl StratificationJob {
    /// Derive the output paths for `features` against the map in `base_dir`.
    pub fn new(base_dir: &Path, features: &Path) -> Result<Self> {
        if features.is_dir() {
            return Err(BedError::InputShape(format!(
                "directory '{}' given where a stratifying features file was expected",
                features.display()
            )));
        }

        let base_dir = std::path::absolute(base_dir)?;
        let features = std::path::absolute(features)?;
        let stratified_dir = parent_dir(&features)?;
        if stratified_dir == base_dir {
            return Err(BedError::InputShape(format!(
                "stratifying features file '{}' is inside the base nucleosome map directory",
                features.display()
            )));
        }

        let base_name = dir_name(&base_dir)?;
        let stratified_name = dir_name(&stratified_dir)?;
        let stratified_map = stratified_dir.join(format!("{}.bed", stratified_name));
        if stratified_map == features {
            return Err(BedError::InputShape(format!(
                "stratifying features file '{}' has the name of the stratified map it would produce",
                features.display()
            )));
        }

        Ok(Self {
            original_map: base_dir.join(format!("{}.bed", base_name)),
            stratified_map,
            conditions: stratified_dir.join(CONDITIONS_FILE),
            counts_table: stratified_dir
                .join(INTERMEDIATE_DIR)
                .join(format!("{}_encompassment_counts.tsv", stratified_name)),
            features,
        })
    }
}

/// Result of one stratification job.
#[derive(Debug, Clone)]
pub struct StratificationOutcome {
    pub job: StratificationJob,
    pub retained: usize,
    pub stats: OverlapCountStats,
}

/// Stratify a nucleosome map by one or more feature range files.
#[derive(Debug, Clone, Default)]
pub struct StratifyCommand {
    /// Skip the up-front sort verification of input files.
    pub assume_sorted: bool,
}

impl StratifyCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the jobs for a base map (directory, or a file inside it) and a
    /// set of features files. Duplicate features paths are merged; distinct
    /// features files that would share an output directory are rejected.
    pub fn plan<P: AsRef<Path>>(&self, base_map: &Path, features: &[P]) -> Result<Vec<StratificationJob>> {
        let base_dir = if base_map.is_file() {
            parent_dir(base_map)?
        } else {
            std::path::absolute(base_map)?
        };

        let mut unique = BTreeSet::new();
        for path in features {
            unique.insert(std::path::absolute(path.as_ref())?);
        }

        let jobs: Vec<StratificationJob> = unique
            .iter()
            .map(|features| StratificationJob::new(&base_dir, features))
            .collect::<Result<_>>()?;

        let mut outputs = BTreeSet::new();
        for job in &jobs {
            if !outputs.insert(job.stratified_map.as_path()) {
                return Err(BedError::InputShape(format!(
                    "stratifying features file '{}' shares its directory with another features file",
                    job.features.display()
                )));
            }
        }
        Ok(jobs)
    }

    /// Run every job. Jobs share no state and run in parallel; the first
    /// failure aborts the run.
    pub fn run<P: AsRef<Path>>(
        &self,
        base_map: &Path,
        features: &[P],
    ) -> Result<Vec<StratificationOutcome>> {
        let jobs = self.plan(base_map, features)?;
        jobs.into_par_iter().map(|job| self.run_job(job)).collect()
    }

    /// Count, rewrite and record provenance for one job.
    pub fn run_job(&self, job: StratificationJob) -> Result<StratificationOutcome> {
        info!("Working in {}", file_name(&job.features));

        if let Some(intermediate) = job.counts_table.parent() {
            fs::create_dir_all(intermediate)?;
        }

        let counter = OverlapCountCommand {
            assume_sorted: self.assume_sorted,
            label: NUCLEOSOME_LABEL.to_string(),
        };
        let (counts, stats) = counter.run(&job.features, &job.original_map, &job.counts_table)?;

        info!("Writing results to new nucleosome map {}", job.stratified_map.display());
        let retained = write_atomically(&job.stratified_map, |file| {
            let original = BedReader::from_path(&job.original_map)?.positions();
            StratifiedRewriter::new().rewrite_counts(original, &counts, file)
        })?;
        if retained == 0 {
            warn!(
                "No nucleosomes of {} fall inside {}",
                file_name(&job.original_map),
                file_name(&job.features)
            );
        }

        write_atomically(&job.conditions, |file| {
            write_provenance(file, &job.original_map, &job.features)
        })?;

        Ok(StratificationOutcome {
            job,
            retained,
            stats,
        })
    }
}
