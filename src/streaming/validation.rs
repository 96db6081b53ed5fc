//! Sort validation for streaming operations.
//!
//! The overlap sweep and the rewrite pass both require input sorted by
//! chromosome (lexicographic, byte order) and then position (numeric). This
//! is the order produced by `sort -k1,1 -k2,2n` and by [`SortCommand`].
//!
//! [`SortCommand`]: crate::commands::SortCommand

use crate::bed::{BedError, BedReader};
use std::cmp::Ordering;
use std::path::Path;

/// Verify that a positional or interval bed file is sorted.
///
/// Only the chromosome and start columns are inspected, so this works for
/// both encompassing and encompassed files.
///
/// # Example
///
/// ```rust,no_run
/// use mutperiod::streaming::verify_sorted;
///
/// verify_sorted("nucleosome_map.bed").expect("File must be sorted");
/// ```
pub fn verify_sorted<P: AsRef<Path>>(path: P) -> Result<(), BedError> {
    let path = path.as_ref();
    let file_id = path.display().to_string();
    let mut validator = SortValidator::new();

    for interval in BedReader::from_path(path)?.intervals() {
        let interval = interval?;
        validator.validate_with_file(&interval.chrom, interval.start, &file_id)?;
    }

    Ok(())
}

/// Inline sort validator for use within streaming loops.
///
/// Validates that each record's (chromosome, position) is not less than the
/// previous one's, with chromosomes compared as bytes.
#[derive(Debug, Default)]
pub struct SortValidator {
    prev_chrom: Option<String>,
    prev_start: u64,
    record_count: usize,
}

impl SortValidator {
    /// Create a new sort validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that the given record maintains sort order.
    #[inline]
    pub fn validate(&mut self, chrom: &str, start: u64) -> Result<(), BedError> {
        self.check(chrom, start, None)
    }

    /// Validate, naming the file in the error message.
    #[inline]
    pub fn validate_with_file(
        &mut self,
        chrom: &str,
        start: u64,
        file_id: &str,
    ) -> Result<(), BedError> {
        self.check(chrom, start, Some(file_id))
    }

    fn check(&mut self, chrom: &str, start: u64, file_id: Option<&str>) -> Result<(), BedError> {
        self.record_count += 1;

        if let Some(ref pc) = self.prev_chrom {
            let location = match file_id {
                Some(id) => format!("{} record {}", id, self.record_count),
                None => format!("record {}", self.record_count),
            };
            match chrom.as_bytes().cmp(pc.as_bytes()) {
                Ordering::Less => {
                    return Err(BedError::OrderingViolation(format!(
                        "chromosome '{}' at {} comes after '{}' (chromosomes must be in lexicographic order)",
                        chrom, location, pc
                    )));
                }
                Ordering::Equal if start < self.prev_start => {
                    return Err(BedError::OrderingViolation(format!(
                        "position {} at {} comes after {} on {}",
                        start, location, self.prev_start, chrom
                    )));
                }
                Ordering::Equal => {}
                Ordering::Greater => {
                    if let Some(prev) = self.prev_chrom.as_mut() {
                        prev.clear();
                        prev.push_str(chrom);
                    }
                }
            }
        } else {
            self.prev_chrom = Some(chrom.to_string());
        }

        self.prev_start = start;
        Ok(())
    }

    /// Get the number of records validated.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_bed(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_verify_sorted_valid() {
        let file = create_temp_bed("chr1\t100\t200\nchr1\t200\t300\nchr2\t100\t200\n");
        assert!(verify_sorted(file.path()).is_ok());
    }

    #[test]
    fn test_verify_sorted_lexicographic_chrom_order() {
        // chr10 sorts before chr2 in byte order
        let file = create_temp_bed("chr1\t5\t6\nchr10\t1\t2\nchr2\t1\t2\n");
        assert!(verify_sorted(file.path()).is_ok());
    }

    #[test]
    fn test_verify_sorted_natural_order_rejected() {
        let file = create_temp_bed("chr2\t100\t200\nchr10\t100\t200\n");
        let err = verify_sorted(file.path()).unwrap_err();
        assert!(matches!(err, BedError::OrderingViolation(_)));
        assert!(err.to_string().contains("chr10"));
    }

    #[test]
    fn test_verify_sorted_invalid_position() {
        let file = create_temp_bed("chr1\t200\t300\nchr1\t100\t200\n");
        let err = verify_sorted(file.path()).unwrap_err();
        assert!(matches!(err, BedError::OrderingViolation(_)));
        assert!(err.to_string().contains("position 100"));
    }

    #[test]
    fn test_sort_validator() {
        let mut validator = SortValidator::new();
        assert!(validator.validate("chr1", 100).is_ok());
        assert!(validator.validate("chr1", 100).is_ok());
        assert!(validator.validate("chr1", 200).is_ok());
        assert!(validator.validate("chr2", 50).is_ok());
        assert_eq!(validator.record_count(), 4);
    }

    #[test]
    fn test_sort_validator_position_decrease() {
        let mut validator = SortValidator::new();
        assert!(validator.validate("chr1", 200).is_ok());
        assert!(validator.validate("chr1", 100).is_err());
    }

    #[test]
    fn test_sort_validator_chromosome_decrease() {
        let mut validator = SortValidator::new();
        assert!(validator.validate("chr2", 1).is_ok());
        let err = validator.validate_with_file("chr1", 500, "a.bed").unwrap_err();
        assert!(err.to_string().contains("a.bed record 2"));
    }
}
