//! Workbook ingestion for uploaded `.xls` / `.xlsx` invoices.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::source::{CellValue, RawTable, SourceMetadata};
use crate::error::{NormalizerError, Result, StructuralError};

/// Largest serial Excel accepts (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Workbook formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkbookFormat {
    Xls,
    Xlsx,
}

impl WorkbookFormat {
    /// Determine the format from a declared file name.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            Some("xlsx") => Ok(WorkbookFormat::Xlsx),
            Some("xls") => Ok(WorkbookFormat::Xls),
            _ => Err(NormalizerError::UnsupportedFormat(format!(
                "'{}' is not an .xls or .xlsx file",
                name
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkbookFormat::Xls => "xls",
            WorkbookFormat::Xlsx => "xlsx",
        }
    }
}

/// Read the first sheet of an uploaded workbook.
///
/// The first non-empty row is the header row; fully blank rows after it are
/// skipped. Rows are padded or truncated to the header width.
pub fn read_workbook(bytes: &[u8], file_name: &str) -> Result<(RawTable, SourceMetadata)> {
    let format = WorkbookFormat::from_file_name(file_name)?;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| StructuralError::UnreadableSheet("workbook has no sheets".to_string()))?;
    let range = workbook.worksheet_range(&sheet)?;

    let table = table_from_range(&range)?;
    debug!(
        file = file_name,
        sheet = %sheet,
        rows = table.row_count(),
        columns = table.column_count(),
        "read workbook"
    );

    let metadata = SourceMetadata::new(file_name, bytes, format.as_str(), &table);
    Ok((table, metadata))
}

fn table_from_range(range: &Range<Data>) -> Result<RawTable> {
    // Ranges start at the first used cell, not necessarily at A1.
    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows_iter = range
        .rows()
        .enumerate()
        .map(|(i, row)| (first_line + i, row))
        .skip_while(|(_, row)| row.iter().all(is_blank));

    let (_, header_row) = rows_iter.next().ok_or(StructuralError::EmptyHeaderRow)?;
    let headers: Vec<String> = header_row.iter().map(cell_to_header_string).collect();

    // Trailing blank header cells come from formatting, not data.
    let width = headers
        .iter()
        .rposition(|h| !h.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(0);
    if width == 0 {
        return Err(StructuralError::BlankHeaders(headers.len()).into());
    }
    let headers = headers[..width].to_vec();

    let (lines, rows): (Vec<usize>, Vec<Vec<CellValue>>) = rows_iter
        .filter(|(_, row)| !row.iter().all(is_blank))
        .map(|(line, row)| {
            let mut cells: Vec<CellValue> = row.iter().take(width).map(convert_cell).collect();
            cells.resize(width, CellValue::Empty);
            (line, cells)
        })
        .unzip();

    Ok(RawTable::new(headers, rows).with_lines(lines))
}

fn is_blank(c: &Data) -> bool {
    match c {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

fn convert_cell(c: &Data) -> CellValue {
    match c {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_text(s),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
        Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
            Some(value) if value.time().num_seconds_from_midnight() == 0 => {
                CellValue::Date(value.date())
            }
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso(s).unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

fn parse_iso(s: &str) -> Option<CellValue> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(CellValue::Date(d));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(CellValue::DateTime)
}

/// Convert an Excel serial date (1900 date system) to a timestamp.
///
/// Serials count days from 1899-12-30, which absorbs Excel's phantom
/// 1900-02-29 for every date after February 1900.
pub(crate) fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial.floor()) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}
