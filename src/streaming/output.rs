//! Buffered output for bed lines and count tables.
//!
//! Uses itoa for integer formatting to avoid allocation in the hot path.

use crate::bed::{BedError, Result};
use crate::discover::parent_dir;
use crate::interval::PositionId;
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Buffered writer for bed lines and two-column count tables.
pub struct BedWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl<W: Write> BedWriter<W> {
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    /// Write a full line as-is with newline.
    #[inline]
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.writer.write_all(line)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write a tab-joined row of fields.
    pub fn write_fields(&mut self, fields: &[&[u8]]) -> Result<()> {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b"\t")?;
            }
            self.writer.write_all(field)?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write an integer using itoa.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<()> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    /// Write one `identity<TAB>count` row of a counts table.
    #[inline]
    pub fn write_count_row(&mut self, id: &PositionId, count: usize) -> Result<()> {
        self.writer.write_all(id.chrom.as_bytes())?;
        self.writer.write_all(b":")?;
        self.writer
            .write_all(self.itoa_buf.format(id.position).as_bytes())?;
        write!(self.writer, "({})\t", id.strand)?;
        self.write_int(count)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write through a temporary file in the destination directory and move it
/// into place only on success.
pub fn write_atomically<T, F>(path: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut NamedTempFile) -> Result<T>,
{
    let dir = parent_dir(path)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    let value = write(&mut tmp)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| BedError::Io(e.error))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Strand;

    #[test]
    fn test_write_line() {
        let mut output = Vec::new();
        {
            let mut writer = BedWriter::new(&mut output);
            writer.write_line(b"chr1\t100\t101\tid\t.\t+").unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(output, b"chr1\t100\t101\tid\t.\t+\n");
    }

    #[test]
    fn test_write_fields() {
        let mut output = Vec::new();
        {
            let mut writer = BedWriter::new(&mut output);
            writer
                .write_fields(&[
                    "chr1".as_bytes(),
                    b"99",
                    b"100",
                    b"TCA",
                    b"C>T",
                    b"+",
                ])
                .unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(output, b"chr1\t99\t100\tTCA\tC>T\t+\n");
    }

    #[test]
    fn test_write_count_row_matches_display() {
        let id = PositionId::new("chr3", 12345, Strand::Minus);
        let mut output = Vec::new();
        {
            let mut writer = BedWriter::new(&mut output);
            writer.write_count_row(&id, 7).unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(String::from_utf8(output).unwrap(), format!("{}\t7\n", id));
    }
}
