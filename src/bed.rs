//! Streaming readers for positional and interval bed files, and the crate's
//! error type.

use crate::interval::{EncompassingInterval, PositionId, PositionRecord, Strand};
use crate::streaming::buffers::{DEFAULT_INPUT_BUFFER, DEFAULT_LINE_BUFFER};
use crate::streaming::parsing::{parse_u64_fast, should_skip_line, tab_fields, trim_newline};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Number of columns a positional record needs: chrom, start, end, name,
/// score, strand.
pub const POSITION_FIELDS: usize = 6;

/// Number of columns an encompassing interval needs.
pub const INTERVAL_FIELDS: usize = 3;

/// Errors that can occur anywhere in the toolkit.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unexpected input: {0}")]
    InputShape(String),

    #[error("Malformed record in {source_name} at line {line}: {message}")]
    MalformedRecord {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Ordering violation: {0}")]
    OrderingViolation(String),

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, BedError>;

/// A streaming reader for tab-delimited bed files.
///
/// Blank lines, comments and track/browser headers are skipped. Records are
/// produced lazily, one line at a time.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    source_name: String,
    line_number: usize,
    buffer: String,
}

impl BedReader<File> {
    /// Open a bed file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            BedError::Io(io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Ok(Self::with_capacity(file, DEFAULT_INPUT_BUFFER).named(path.display().to_string()))
    }
}

impl<R: Read> BedReader<R> {
    /// Create a new reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_INPUT_BUFFER)
    }

    /// Create a reader with custom buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            source_name: "<input>".to_string(),
            line_number: 0,
            buffer: String::with_capacity(DEFAULT_LINE_BUFFER),
        }
    }

    /// Name used for this source in error messages.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Line number of the most recently read line (1-based).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Advance to the next data line. Returns false at end of input.
    fn next_data_line(&mut self) -> Result<bool> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(false);
            }
            self.line_number += 1;

            let line = trim_newline(&self.buffer);
            if should_skip_line(line.as_bytes()) {
                continue;
            }
            return Ok(true);
        }
    }

    fn malformed(&self, message: impl Into<String>) -> BedError {
        BedError::MalformedRecord {
            source_name: self.source_name.clone(),
            line: self.line_number,
            message: message.into(),
        }
    }

    /// Read the next positional record (chrom, start, end, name, score, strand).
    pub fn read_position(&mut self) -> Result<Option<PositionRecord>> {
        if !self.next_data_line()? {
            return Ok(None);
        }
        self.parse_position().map(Some)
    }

    fn parse_position(&self) -> Result<PositionRecord> {
        let line = trim_newline(&self.buffer);
        let mut fields = [&b""[..]; POSITION_FIELDS];
        let mut count = 0;
        for field in tab_fields(line.as_bytes()) {
            if count < POSITION_FIELDS {
                fields[count] = field;
            }
            count += 1;
        }

        if count < POSITION_FIELDS {
            return Err(self.malformed(format!(
                "Expected at least {} tab-delimited fields, got {}",
                POSITION_FIELDS, count
            )));
        }

        let chrom = self.parse_chrom(fields[0])?;
        let position = self.parse_coordinate(fields[1], "start")?;
        // The end column is not part of the identity, but it must still be numeric.
        let end = self.parse_coordinate(fields[2], "end")?;
        if end < position {
            return Err(self.malformed(format!("End ({}) < start ({})", end, position)));
        }
        let strand = Strand::from_field(std::str::from_utf8(fields[5]).unwrap_or(""));

        Ok(PositionRecord::new(
            PositionId::new(chrom, position, strand),
            line,
        ))
    }

    /// Read the next encompassing interval (chrom, start, end, ...).
    pub fn read_interval(&mut self) -> Result<Option<EncompassingInterval>> {
        if !self.next_data_line()? {
            return Ok(None);
        }
        self.parse_interval().map(Some)
    }

    fn parse_interval(&self) -> Result<EncompassingInterval> {
        let line = trim_newline(&self.buffer);
        let mut fields = tab_fields(line.as_bytes());
        let (chrom, start, end) = match (fields.next(), fields.next(), fields.next()) {
            (Some(c), Some(s), Some(e)) => (c, s, e),
            _ => {
                return Err(self.malformed(format!(
                    "Expected at least {} tab-delimited fields",
                    INTERVAL_FIELDS
                )))
            }
        };

        let chrom = self.parse_chrom(chrom)?;
        let start = self.parse_coordinate(start, "start")?;
        let end = self.parse_coordinate(end, "end")?;
        if end < start {
            return Err(self.malformed(format!("End ({}) < start ({})", end, start)));
        }

        Ok(EncompassingInterval::from_bed(chrom, start, end))
    }

    fn parse_chrom<'a>(&self, field: &'a [u8]) -> Result<&'a str> {
        match std::str::from_utf8(field) {
            Ok(chrom) if !chrom.is_empty() => Ok(chrom),
            Ok(_) => Err(self.malformed("Empty chromosome field")),
            Err(_) => Err(self.malformed("Chromosome field is not valid UTF-8")),
        }
    }

    fn parse_coordinate(&self, field: &[u8], field_name: &str) -> Result<u64> {
        parse_u64_fast(field).ok_or_else(|| {
            self.malformed(format!(
                "Invalid {} position: '{}'",
                field_name,
                String::from_utf8_lossy(field)
            ))
        })
    }

    /// Iterator over positional records.
    pub fn positions(self) -> PositionIter<R> {
        PositionIter { reader: self }
    }

    /// Iterator over encompassing intervals.
    pub fn intervals(self) -> IntervalIter<R> {
        IntervalIter { reader: self }
    }
}

/// Iterator over positional records.
pub struct PositionIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> PositionIter<R> {
    pub fn source_name(&self) -> &str {
        self.reader.source_name()
    }
}

impl<R: Read> Iterator for PositionIter<R> {
    type Item = Result<PositionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_position().transpose()
    }
}

/// Iterator over encompassing intervals.
pub struct IntervalIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> IntervalIter<R> {
    pub fn source_name(&self) -> &str {
        self.reader.source_name()
    }
}

impl<R: Read> Iterator for IntervalIter<R> {
    type Item = Result<EncompassingInterval>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_interval().transpose()
    }
}

/// Read all positional records from a file.
pub fn read_positions<P: AsRef<Path>>(path: P) -> Result<Vec<PositionRecord>> {
    BedReader::from_path(path)?.positions().collect()
}

/// Read all encompassing intervals from a file.
pub fn read_intervals<P: AsRef<Path>>(path: P) -> Result<Vec<EncompassingInterval>> {
    BedReader::from_path(path)?.intervals().collect()
}

/// Parse positional records from a string (useful for testing).
pub fn parse_positions(content: &str) -> Result<Vec<PositionRecord>> {
    BedReader::new(content.as_bytes()).positions().collect()
}

/// Parse encompassing intervals from a string (useful for testing).
pub fn parse_intervals(content: &str) -> Result<Vec<EncompassingInterval>> {
    BedReader::new(content.as_bytes()).intervals().collect()
}
