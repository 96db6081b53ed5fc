//! Core record types: encompassed positions and encompassing intervals.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Plus,
    Minus,
    Unspecified,
}

impl Strand {
    pub fn from_char(c: char) -> Self {
        match c {
            '+' => Strand::Plus,
            '-' => Strand::Minus,
            _ => Strand::Unspecified,
        }
    }

    /// Parse a strand column, treating anything but `+`/`-` as unspecified.
    pub fn from_field(field: &str) -> Self {
        let mut chars = field.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Strand::from_char(c),
            _ => Strand::Unspecified,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
            Strand::Unspecified => write!(f, "."),
        }
    }
}

/// Identity of a positional record: chromosome, 0-based position and strand.
///
/// Renders as `chr1:150(+)`, the same shape used for lesion IDs, and parses
/// back from that form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionId {
    pub chrom: String,
    pub position: u64,
    pub strand: Strand,
}

impl PositionId {
    #[inline]
    pub fn new(chrom: impl Into<String>, position: u64, strand: Strand) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            strand,
        }
    }

    /// Compare by the sort key shared by every input stream: chromosome bytes,
    /// then position. Strand does not take part in ordering.
    #[inline]
    pub fn cmp_locus(&self, other: &PositionId) -> Ordering {
        self.chrom
            .as_bytes()
            .cmp(other.chrom.as_bytes())
            .then(self.position.cmp(&other.position))
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.chrom, self.position, self.strand)
    }
}

/// Error returned when a string is not a `chrom:position(strand)` identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePositionIdError(pub String);

impl fmt::Display for ParsePositionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid position identity '{}'", self.0)
    }
}

impl std::error::Error for ParsePositionIdError {}

impl FromStr for PositionId {
    type Err = ParsePositionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePositionIdError(s.to_string());

        // Chromosome names may themselves contain ':', so split on the last one.
        let (chrom, rest) = s.rsplit_once(':').ok_or_else(err)?;
        if chrom.is_empty() {
            return Err(err());
        }

        let (position, strand) = match rest.split_once('(') {
            Some((pos, strand)) => {
                let strand = strand.strip_suffix(')').ok_or_else(err)?;
                (pos, Strand::from_field(strand))
            }
            None => (rest, Strand::Unspecified),
        };
        let position = position.parse().map_err(|_| err())?;

        Ok(PositionId::new(chrom, position, strand))
    }
}

/// One line of a sorted positional bed file.
///
/// The original line is kept so stratified maps can be written verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRecord {
    pub id: PositionId,
    pub raw_line: String,
}

impl PositionRecord {
    pub fn new(id: PositionId, raw_line: impl Into<String>) -> Self {
        Self {
            id,
            raw_line: raw_line.into(),
        }
    }

    #[inline]
    pub fn chrom(&self) -> &str {
        &self.id.chrom
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.id.position
    }

    #[inline]
    pub fn strand(&self) -> Strand {
        self.id.strand
    }
}

/// A range that may contain positions. Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncompassingInterval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl EncompassingInterval {
    #[inline]
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Build from half-open bed coordinates.
    ///
    /// The exclusive bed end becomes the inclusive last base. Zero-length
    /// intervals are widened to the single base at `start`.
    #[inline]
    pub fn from_bed(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        let last = if end > start { end - 1 } else { start };
        Self::new(chrom, start, last)
    }

    /// Inclusive containment on the same chromosome.
    #[inline]
    pub fn contains(&self, chrom: &str, position: u64) -> bool {
        self.chrom == chrom && self.start <= position && position <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand_from_field() {
        assert_eq!(Strand::from_field("+"), Strand::Plus);
        assert_eq!(Strand::from_field("-"), Strand::Minus);
        assert_eq!(Strand::from_field("."), Strand::Unspecified);
        assert_eq!(Strand::from_field(""), Strand::Unspecified);
        assert_eq!(Strand::from_field("+-"), Strand::Unspecified);
    }

    #[test]
    fn test_position_id_display() {
        let id = PositionId::new("chr1", 150, Strand::Plus);
        assert_eq!(id.to_string(), "chr1:150(+)");

        let id = PositionId::new("chrX", 7, Strand::Unspecified);
        assert_eq!(id.to_string(), "chrX:7(.)");
    }

    #[test]
    fn test_position_id_parse() {
        let id: PositionId = "chr1:150(-)".parse().unwrap();
        assert_eq!(id, PositionId::new("chr1", 150, Strand::Minus));

        let id: PositionId = "chr2:99".parse().unwrap();
        assert_eq!(id, PositionId::new("chr2", 99, Strand::Unspecified));

        let id: PositionId = "HLA-A*01:01:01:01:42(+)".parse().unwrap();
        assert_eq!(id.chrom, "HLA-A*01:01:01:01");
        assert_eq!(id.position, 42);
    }

    #[test]
    fn test_position_id_parse_invalid() {
        assert!("chr1".parse::<PositionId>().is_err());
        assert!(":10(+)".parse::<PositionId>().is_err());
        assert!("chr1:abc(+)".parse::<PositionId>().is_err());
        assert!("chr1:10(+".parse::<PositionId>().is_err());
    }

    #[test]
    fn test_cmp_locus_ignores_strand() {
        let a = PositionId::new("chr1", 100, Strand::Plus);
        let b = PositionId::new("chr1", 100, Strand::Minus);
        let c = PositionId::new("chr10", 5, Strand::Plus);
        let d = PositionId::new("chr2", 1, Strand::Plus);

        assert_eq!(a.cmp_locus(&b), Ordering::Equal);
        // Lexicographic chromosome order: chr1 < chr10 < chr2
        assert_eq!(a.cmp_locus(&c), Ordering::Less);
        assert_eq!(c.cmp_locus(&d), Ordering::Less);
    }

    #[test]
    fn test_interval_contains_inclusive() {
        let interval = EncompassingInterval::new("chr1", 100, 200);
        assert!(interval.contains("chr1", 100));
        assert!(interval.contains("chr1", 200));
        assert!(!interval.contains("chr1", 99));
        assert!(!interval.contains("chr1", 201));
        assert!(!interval.contains("chr2", 150));
    }

    #[test]
    fn test_interval_from_bed() {
        let interval = EncompassingInterval::from_bed("chr1", 100, 200);
        assert_eq!((interval.start, interval.end), (100, 199));

        let zero = EncompassingInterval::from_bed("chr1", 50, 50);
        assert_eq!((zero.start, zero.end), (50, 50));
    }
}
