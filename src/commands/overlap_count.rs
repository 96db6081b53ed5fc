//! Sorted interval overlap counter.
//!
//! For every encompassed position record, counts the encompassing intervals
//! that contain it, in one forward sweep over both inputs.
//!
//! Memory complexity: O(k) where k = max encompassing intervals active at any
//! position, plus one count per encompassed record.
//!
//! REQUIREMENT: Both inputs must be sorted by (chrom, start) with chromosomes
//! in lexicographic byte order. Order is checked inline; file-based runs also
//! verify both files up front unless `assume_sorted` is set.

use crate::bed::{BedReader, Result};
use crate::interval::{EncompassingInterval, PositionId, PositionRecord};
use crate::streaming::output::write_atomically;
use crate::streaming::{verify_sorted, ActiveSet, BedWriter, SortValidator};
use log::{debug, info};
use std::cmp::Ordering;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Column header for the count column of a counts table.
pub const COUNT_COLUMN: &str = "Encompassing_Feature_Counts";

/// Default header for the identity column of a counts table.
pub const DEFAULT_LABEL: &str = "Encompassed_Feature";

/// Number of encompassing intervals containing one encompassed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapCount {
    pub id: PositionId,
    pub count: usize,
}

impl OverlapCount {
    pub fn new(id: PositionId, count: usize) -> Self {
        Self { id, count }
    }
}

/// Statistics from one counting sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapCountStats {
    pub encompassed_records: usize,
    pub encompassing_intervals: usize,
    pub records_with_overlap: usize,
    pub max_active: usize,
}

impl fmt::Display for OverlapCountStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "encompassed={}, encompassing={}, with_overlap={}, max_active={}",
            self.encompassed_records,
            self.encompassing_intervals,
            self.records_with_overlap,
            self.max_active
        )
    }
}

/// Overlap counter configuration.
#[derive(Debug, Clone)]
pub struct OverlapCountCommand {
    /// Skip the up-front sort verification of input files.
    pub assume_sorted: bool,
    /// Header for the identity column of the counts table.
    pub label: String,
}

impl Default for OverlapCountCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlapCountCommand {
    pub fn new() -> Self {
        Self {
            assume_sorted: false,
            label: DEFAULT_LABEL.to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Count containing intervals for every encompassed record.
    ///
    /// Both sequences are consumed lazily and in lockstep. The result holds
    /// one entry per encompassed record, in input order, including zeros.
    pub fn count<I, J>(
        &self,
        encompassing: I,
        encompassed: J,
    ) -> Result<(Vec<OverlapCount>, OverlapCountStats)>
    where
        I: IntoIterator<Item = Result<EncompassingInterval>>,
        J: IntoIterator<Item = Result<PositionRecord>>,
    {
        let mut encompassing = encompassing.into_iter();
        let mut interval_validator = SortValidator::new();
        let mut record_validator = SortValidator::new();
        let mut stats = OverlapCountStats::default();

        let mut pending =
            Self::next_interval(&mut encompassing, &mut interval_validator, &mut stats)?;
        let mut active = ActiveSet::new();
        let mut current_chrom: Vec<u8> = Vec::with_capacity(64);
        let mut counts = Vec::new();

        for record in encompassed {
            let record = record?;
            let chrom = record.chrom();
            let position = record.position();
            record_validator.validate_with_file(chrom, position, "encompassed input")?;

            if chrom.as_bytes() != current_chrom.as_slice() {
                current_chrom.clear();
                current_chrom.extend_from_slice(chrom.as_bytes());
                active.clear();
            }

            // Admit intervals that start at or before this position, dropping
            // any on chromosomes that sort before the current one.
            while let Some(interval) = pending.as_ref() {
                match interval.chrom.as_bytes().cmp(chrom.as_bytes()) {
                    Ordering::Less => {}
                    Ordering::Equal if interval.start <= position => {
                        active.push(interval.end);
                    }
                    _ => break,
                }
                pending =
                    Self::next_interval(&mut encompassing, &mut interval_validator, &mut stats)?;
            }

            // Every admitted interval starts at or before `position`, so the
            // survivors of expiry are exactly the containing ones.
            active.expire_before(position);
            let count = active.len();

            stats.encompassed_records += 1;
            if count > 0 {
                stats.records_with_overlap += 1;
            }
            counts.push(OverlapCount::new(record.id, count));
        }

        stats.max_active = active.max_active();
        Ok((counts, stats))
    }

    fn next_interval<I>(
        encompassing: &mut I,
        validator: &mut SortValidator,
        stats: &mut OverlapCountStats,
    ) -> Result<Option<EncompassingInterval>>
    where
        I: Iterator<Item = Result<EncompassingInterval>>,
    {
        match encompassing.next() {
            Some(interval) => {
                let interval = interval?;
                validator.validate_with_file(&interval.chrom, interval.start, "encompassing input")?;
                stats.encompassing_intervals += 1;
                Ok(Some(interval))
            }
            None => Ok(None),
        }
    }

    /// Count over two sorted bed files.
    pub fn count_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        encompassing_path: P,
        encompassed_path: Q,
    ) -> Result<(Vec<OverlapCount>, OverlapCountStats)> {
        let encompassing_path = encompassing_path.as_ref();
        let encompassed_path = encompassed_path.as_ref();

        if !self.assume_sorted {
            verify_sorted(encompassing_path)?;
            verify_sorted(encompassed_path)?;
        }

        info!(
            "Counting features of {} encompassing {}",
            encompassing_path.display(),
            encompassed_path.display()
        );

        let intervals = BedReader::from_path(encompassing_path)?.intervals();
        let records = BedReader::from_path(encompassed_path)?.positions();
        let (counts, stats) = self.count(intervals, records)?;
        debug!("Overlap count stats: {}", stats);
        Ok((counts, stats))
    }

    /// Write a counts table with a header row.
    pub fn write_table<W: Write>(&self, counts: &[OverlapCount], output: W) -> Result<()> {
        let mut writer = BedWriter::new(output);
        writer.write_fields(&[self.label.as_bytes(), COUNT_COLUMN.as_bytes()])?;
        for entry in counts {
            writer.write_count_row(&entry.id, entry.count)?;
        }
        writer.flush()
    }

    /// Count over two files and write the counts table to `output_path`.
    ///
    /// The table is written to a temporary file once the sweep succeeds and
    /// persisted over `output_path` only when complete.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>, O: AsRef<Path>>(
        &self,
        encompassing_path: P,
        encompassed_path: Q,
        output_path: O,
    ) -> Result<(Vec<OverlapCount>, OverlapCountStats)> {
        let (counts, stats) = self.count_files(encompassing_path, encompassed_path)?;
        write_atomically(output_path.as_ref(), |file| self.write_table(&counts, file))?;
        Ok((counts, stats))
    }
}
