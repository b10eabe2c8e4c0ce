//! Delimited text parser with delimiter detection.
//!
//! Uploaded invoices are workbooks, but exports and fixtures often arrive as
//! CSV/TSV; this reader produces the same [`RawTable`] for them.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::source::{CellValue, RawTable, SourceMetadata};
use crate::error::{NormalizerError, Result, StructuralError};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses delimited text files into a [`RawTable`].
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(RawTable, SourceMetadata)> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| NormalizerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.parse_named_bytes(&contents, &name)
    }

    /// Parse in-memory bytes that came from a file called `name`.
    pub fn parse_named_bytes(&self, contents: &[u8], name: &str) -> Result<(RawTable, SourceMetadata)> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(contents)?,
        };

        let table = self.parse_bytes(contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        };

        let metadata = SourceMetadata::new(name, contents, format, &table);
        Ok((table, metadata))
    }

    /// Parse bytes with a known delimiter.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|s| s.trim_start_matches('\u{feff}').to_string())
            .collect();

        if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
            return Err(StructuralError::EmptyHeaderRow.into());
        }

        let expected_cols = headers.len();
        let mut rows = Vec::new();
        let mut lines = Vec::new();

        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            if record.iter().all(|s| s.trim().is_empty()) {
                continue;
            }

            let mut row: Vec<CellValue> = record.iter().map(CellValue::from_text).collect();
            row.resize(expected_cols, CellValue::Empty);
            let line = record
                .position()
                .map(|pos| pos.line() as usize)
                .unwrap_or(row_idx + 2);
            lines.push(line);
            rows.push(row);
        }

        Ok(RawTable::new(headers, rows).with_lines(lines))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .map_while(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(NormalizerError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        let variance = counts
            .iter()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / counts.len() as f64;

        // Tab gets a small bonus: it rarely appears inside invoice text.
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_detect_delimiter_ignores_quoted_commas() {
        let data = b"Style;Description\nA1;\"Shirt, cotton\"\nB2;\"Pants, wool\"";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_parse_csv() {
        let parser = Parser::new();
        let data = b"Style,Qty,Amount\nA100,12,\"1,200.00\"\nB200,,30";
        let table = parser.parse_bytes(data, b',').unwrap();

        assert_eq!(table.headers, vec!["Style", "Qty", "Amount"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 2), &CellValue::Text("1,200.00".to_string()));
        assert_eq!(table.cell(1, 1), &CellValue::Empty);
    }

    #[test]
    fn test_parse_skips_blank_rows_and_pads() {
        let parser = Parser::new();
        let data = b"a,b,c\n1,2\n,,\n4,5,6";
        let table = parser.parse_bytes(data, b',').unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.cell(0, 2), &CellValue::Empty);
        assert_eq!(table.line(0), 2);
        assert_eq!(table.line(1), 4);
    }

    #[test]
    fn test_parse_named_bytes_metadata() {
        let parser = Parser::new();
        let (table, meta) = parser
            .parse_named_bytes(b"a\tb\n1\t2\n", "invoice.tsv")
            .unwrap();

        assert_eq!(meta.file, "invoice.tsv");
        assert_eq!(meta.format, "tsv");
        assert_eq!(meta.row_count, table.row_count());
        assert_eq!(meta.column_count, 2);
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "Style,Qty\nA1,3\n").unwrap();

        let (table, meta) = Parser::new().parse_file(&path).unwrap();
        assert_eq!(meta.file, "export.csv");
        assert_eq!(table.cell(0, 1), &CellValue::Text("3".to_string()));

        let missing = Parser::new().parse_file(dir.path().join("nope.csv"));
        assert!(matches!(missing, Err(NormalizerError::Io { .. })));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let parser = Parser::new();
        assert!(parser.parse_named_bytes(b"", "empty.csv").is_err());
    }
}
