//! Serializes canonical records into the fixed output layout.

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, Worksheet};

use super::format::OutputFormat;
use crate::error::{NormalizerError, Result};
use crate::normalize::{CanonicalRecord, CanonicalValue};
use crate::schema::TargetSchema;

/// Excel's cell text limit.
const MAX_CELL_CHARS: usize = 32_767;

/// Writes records column-for-column in the schema's output order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaWriter {
    format: OutputFormat,
}

impl SchemaWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Produce the output file bytes. Identical input yields identical bytes.
    pub fn write(&self, records: &[CanonicalRecord], schema: &TargetSchema) -> Result<Vec<u8>> {
        match self.format {
            OutputFormat::Xlsx => write_xlsx(records, schema),
            OutputFormat::Csv => write_csv(records, schema),
        }
    }
}

/// Output header row: display names in column order.
fn header_row(schema: &TargetSchema) -> Vec<&str> {
    schema
        .columns()
        .into_iter()
        .map(|column| schema.display_name(column).unwrap_or(column))
        .collect()
}

fn write_xlsx(records: &[CanonicalRecord], schema: &TargetSchema) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    // Pinned so repeated runs produce the same bytes.
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    let properties = DocProperties::new().set_creation_datetime(&created);
    workbook.set_properties(&properties);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&schema.sheet_name)?;

    let bold = Format::new().set_bold();
    for (col, title) in header_row(schema).into_iter().enumerate() {
        worksheet.write_string_with_format(0, col_index(col)?, title, &bold)?;
    }

    let columns = schema.columns();
    for (i, record) in records.iter().enumerate() {
        let row = u32::try_from(i + 1).map_err(|_| too_large("rows"))?;
        for (col, column) in columns.iter().enumerate() {
            if let Some(value) = record.get(column) {
                write_value(worksheet, row, col_index(col)?, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_value(worksheet: &mut Worksheet, row: u32, col: u16, value: &CanonicalValue) -> Result<()> {
    match value {
        CanonicalValue::Text(s) => {
            worksheet.write_string(row, col, truncate_cell(s))?;
        }
        CanonicalValue::Number(n) | CanonicalValue::Currency(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        CanonicalValue::Date(_) => {
            worksheet.write_string(row, col, value.render())?;
        }
    }
    Ok(())
}

fn write_csv(records: &[CanonicalRecord], schema: &TargetSchema) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header_row(schema))?;

    let columns = schema.columns();
    for record in records {
        writer.write_record(
            columns
                .iter()
                .map(|column| record.get(column).map(CanonicalValue::render).unwrap_or_default()),
        )?;
    }

    writer
        .into_inner()
        .map_err(|e| NormalizerError::Csv(csv::Error::from(e.into_error())))
}

fn col_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| too_large("columns"))
}

fn too_large(what: &str) -> NormalizerError {
    NormalizerError::Config(format!("too many {} for one worksheet", what))
}

fn truncate_cell(s: &str) -> &str {
    match s.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
