//! Zero-allocation field parsing for tab-delimited bed lines.
//!
//! These functions work on raw bytes and never allocate; callers decide how
//! a parse failure is reported.

use memchr::memchr;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty, contains non-digit characters or
/// overflows.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Iterator over the tab-separated fields of a line, backed by memchr.
#[derive(Debug, Clone)]
pub struct TabFields<'a> {
    rest: Option<&'a [u8]>,
}

impl<'a> Iterator for TabFields<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<&'a [u8]> {
        let rest = self.rest?;
        match memchr(b'\t', rest) {
            Some(idx) => {
                self.rest = Some(&rest[idx + 1..]);
                Some(&rest[..idx])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Split a line (without its newline) into tab-separated fields.
#[inline]
pub fn tab_fields(line: &[u8]) -> TabFields<'_> {
    TabFields { rest: Some(line) }
}

/// Parse the sort key (chrom, start) of a bed line.
///
/// Only the first two columns are inspected.
#[inline(always)]
pub fn parse_bed_key(line: &[u8]) -> Option<(&[u8], u64)> {
    let tab1 = memchr(b'\t', line)?;
    let chrom = &line[..tab1];
    if chrom.is_empty() {
        return None;
    }

    let rest = &line[tab1 + 1..];
    let start_len = memchr(b'\t', rest).unwrap_or(rest.len());
    let start = parse_u64_fast(&rest[..start_len])?;

    Some((chrom, start))
}

/// Check if a line should be skipped (empty, comment, or header).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#' || line.starts_with(b"track") || line.starts_with(b"browser")
}

/// Strip a trailing `\n` or `\r\n`.
#[inline(always)]
pub fn trim_newline(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_fast() {
        assert_eq!(parse_u64_fast(b"12345"), Some(12345));
        assert_eq!(parse_u64_fast(b"0"), Some(0));
        assert_eq!(parse_u64_fast(b""), None);
        assert_eq!(parse_u64_fast(b"abc"), None);
        assert_eq!(parse_u64_fast(b"-5"), None);
        assert_eq!(parse_u64_fast(b"18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_u64_fast(b"18446744073709551616"), None);
    }

    #[test]
    fn test_tab_fields() {
        let fields: Vec<&[u8]> = tab_fields(b"chr1\t100\t101\tid\t.\t+").collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0], b"chr1");
        assert_eq!(fields[5], b"+");

        let fields: Vec<&[u8]> = tab_fields(b"a\t\tb").collect();
        assert_eq!(fields, vec![&b"a"[..], &b""[..], &b"b"[..]]);

        assert_eq!(tab_fields(b"").count(), 1);
    }

    #[test]
    fn test_parse_bed_key() {
        assert_eq!(parse_bed_key(b"chr1\t100\t200"), Some((&b"chr1"[..], 100)));
        assert_eq!(parse_bed_key(b"chr1\t100"), Some((&b"chr1"[..], 100)));
        assert_eq!(parse_bed_key(b"chr1"), None);
        assert_eq!(parse_bed_key(b"\t100\t200"), None);
        assert_eq!(parse_bed_key(b"chr1\tx\t200"), None);
    }

    #[test]
    fn test_should_skip_line() {
        assert!(should_skip_line(b""));
        assert!(should_skip_line(b"#comment"));
        assert!(should_skip_line(b"track name=foo"));
        assert!(should_skip_line(b"browser position chr1:1-100"));
        assert!(!should_skip_line(b"chr1\t100\t200"));
    }

    #[test]
    fn test_trim_newline() {
        assert_eq!(trim_newline("chr1\t1\n"), "chr1\t1");
        assert_eq!(trim_newline("chr1\t1\r\n"), "chr1\t1");
        assert_eq!(trim_newline("chr1\t1"), "chr1\t1");
    }
}
