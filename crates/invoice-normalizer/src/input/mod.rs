//! Input parsing: uploaded workbooks and delimited text into a [`RawTable`].

mod excel;
mod parser;
mod source;

pub use excel::{read_workbook, WorkbookFormat};
pub(crate) use excel::excel_serial_to_datetime;
pub use parser::{Parser, ParserConfig};
pub use source::{content_hash, CellValue, RawTable, SourceMetadata};
