//! Row reader over the CSV inputs
//!
//! Wraps a [`csv::Reader`] that skips the header row and checks every
//! record against a fixed column count. A record with the wrong number
//! of fields is reported as a parse error for that row only; the reader
//! can keep going afterwards.

use crate::error::{GeoError, Result};
use crate::file_reader;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;

/// Streaming reader of fixed-width CSV rows
pub struct RowReader {
    inner: csv::Reader<Box<dyn Read + Send>>,
    record: StringRecord,
    columns: usize,
}

/// One record borrowed from a [`RowReader`]
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    record: &'a StringRecord,
    line: u64,
}

impl<'a> Row<'a> {
    /// Field `index`, or `""` past the end
    pub fn get(&self, index: usize) -> &'a str {
        self.record.get(index).unwrap_or("")
    }

    /// 1-based line number of the record
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// True for a record with no fields
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }
}

impl RowReader {
    /// Open a (possibly gzip-compressed) CSV file
    pub fn open<P: AsRef<Path>>(path: P, columns: usize) -> Result<Self> {
        let path = path.as_ref();
        let reader = file_reader::open(path)
            .map_err(|e| GeoError::Io(format!("Failed to open {}: {}", path.display(), e)))?;
        Ok(Self::from_boxed(reader, columns))
    }

    /// Read rows from any byte source
    pub fn from_reader<R: Read + Send + 'static>(reader: R, columns: usize) -> Self {
        Self::from_boxed(Box::new(reader), columns)
    }

    fn from_boxed(reader: Box<dyn Read + Send>, columns: usize) -> Self {
        let inner = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        Self {
            inner,
            record: StringRecord::new(),
            columns,
        }
    }

    /// Next data row
    ///
    /// `Some(Err(GeoError::Parse { .. }))` is recoverable: the next call
    /// moves on to the following record. `Some(Err(GeoError::Io(_)))` is not.
    pub fn next_row(&mut self) -> Option<Result<Row<'_>>> {
        match self.inner.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                let line = self.record.position().map(|p| p.line()).unwrap_or(0);
                if self.record.len() != self.columns {
                    return Some(Err(GeoError::parse(
                        line,
                        format!(
                            "expected {} fields, found {}",
                            self.columns,
                            self.record.len()
                        ),
                    )));
                }
                Some(Ok(Row {
                    record: &self.record,
                    line,
                }))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &'static str, columns: usize) -> RowReader {
        RowReader::from_reader(data.as_bytes(), columns)
    }

    #[test]
    fn test_skips_header() {
        let mut rows = reader("a,b\n1,2\n3,4\n", 2);
        let row = rows.next_row().unwrap().unwrap();
        assert_eq!(row.get(0), "1");
        assert_eq!(row.line(), 2);
        let row = rows.next_row().unwrap().unwrap();
        assert_eq!(row.get(1), "4");
        assert!(rows.next_row().is_none());
    }

    #[test]
    fn test_column_mismatch_is_per_row() {
        let mut rows = reader("a,b\n1,2,3\n4,5\n", 2);
        match rows.next_row() {
            Some(Err(GeoError::Parse { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other.map(|r| r.is_ok())),
        }
        let row = rows.next_row().unwrap().unwrap();
        assert_eq!(row.get(0), "4");
    }

    #[test]
    fn test_quoted_fields() {
        let mut rows = reader("id,name\n1,\"Washington, D.C.\"\n", 2);
        let row = rows.next_row().unwrap().unwrap();
        assert_eq!(row.get(1), "Washington, D.C.");
    }

    #[test]
    fn test_missing_field_reads_empty() {
        let mut rows = reader("a,b\n1,\n", 2);
        let row = rows.next_row().unwrap().unwrap();
        assert_eq!(row.get(1), "");
        assert_eq!(row.get(7), "");
    }
}
