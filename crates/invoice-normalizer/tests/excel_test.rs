//! Workbook round trips: client xlsx in, standardized xlsx out.

use std::io::Cursor;
use std::sync::Arc;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

use invoice_normalizer::{
    CanonicalValue, FieldSpec, FieldType, NormalizerError, Pipeline, ProblemKind,
    StructuralError, TargetSchema, read_workbook,
};

/// Build a client workbook: an optional title row, a blank row, the header
/// row and three invoice lines.
fn client_workbook(title: bool) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    if title {
        sheet.write_string(0, 0, "ACME Garments - Commercial Invoice").unwrap();
    }

    let headers = [
        "Export Document",
        "Product Style",
        "desc",
        "Invoice Qty",
        "Amount",
        "Customs Nomenclature",
        "Ship Date",
    ];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(2, col as u16, *header).unwrap();
    }

    let lines = [
        ("INV-9", "P-1", "Knit sweater", 48.0, 960.0, "6110.20"),
        ("INV-9", "P-2", "Denim jacket", 12.0, 480.5, "6201.30"),
        ("INV-9", "P-3", "Desk lamp", 5.0, 75.0, "9405.20"),
    ];
    for (i, (inv, style, desc, qty, amount, hs)) in lines.iter().enumerate() {
        let row = 3 + i as u32;
        sheet.write_string(row, 0, *inv).unwrap();
        sheet.write_string(row, 1, *style).unwrap();
        sheet.write_string(row, 2, *desc).unwrap();
        sheet.write_number(row, 3, *qty).unwrap();
        sheet.write_number(row, 4, *amount).unwrap();
        sheet.write_string(row, 5, *hs).unwrap();
        sheet
            .write_datetime_with_format(
                row,
                6,
                &ExcelDateTime::from_ymd(2024, 3, 15).unwrap(),
                &date_format,
            )
            .unwrap();
    }

    workbook.save_to_buffer().unwrap()
}

fn first_sheet(bytes: Vec<u8>) -> calamine::Range<Data> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
    workbook.worksheet_range_at(0).unwrap().unwrap()
}

#[test]
fn test_first_non_empty_row_is_header() {
    let (table, source) = read_workbook(&client_workbook(true), "Client.XLSX").unwrap();
    assert_eq!(table.headers, vec!["ACME Garments - Commercial Invoice"]);
    assert_eq!(source.format, "xlsx");
    assert!(source.hash.starts_with("sha256:"));

    let (table, _) = read_workbook(&client_workbook(false), "client.xlsx").unwrap();
    assert_eq!(table.headers[0], "Export Document");
    assert_eq!(table.row_count(), 3);
}

#[test]
fn test_invoice_round_trip() {
    let mut schema = TargetSchema::invoice_default();
    schema.fields.push(FieldSpec::new("Ship Date", FieldType::Date));
    let pipeline = Pipeline::new(Arc::new(schema)).unwrap();

    let (result, source) = pipeline
        .process_upload(&client_workbook(false), "invoice.xlsx")
        .unwrap();

    assert_eq!(source.row_count, 3);
    assert!(result.mapping.is_complete());
    assert!(result.problems.is_empty(), "{:?}", result.problems);
    assert_eq!(
        result.records[0].get("Ship Date"),
        Some(&CanonicalValue::Date(
            chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        ))
    );

    let out = first_sheet(result.output);
    let header: Vec<String> = out.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
    assert_eq!(header[0], "Export Invoice #");
    assert_eq!(header[5], "Customs Unit of Measure");

    let rows: Vec<&[Data]> = out.rows().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][5], Data::String("DOZ".into()));
    assert_eq!(rows[0][6], Data::Float(4.0));
    assert_eq!(rows[1][4], Data::Float(480.5));
    assert_eq!(rows[2][5], Data::String("NUM".into()));
    assert_eq!(rows[2][6], Data::Float(5.0));
    assert_eq!(rows[2][7], Data::String("9405.20".into()));
}

#[test]
fn test_problem_lines_follow_the_sheet() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(1, 0, "Qty").unwrap();
    sheet.write_number(2, 0, 1.0).unwrap();
    sheet.write_string(4, 0, "abc").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let pipeline = Pipeline::new(Arc::new(TargetSchema::invoice_default())).unwrap();
    let (result, _) = pipeline.process_upload(&bytes, "gaps.xlsx").unwrap();

    assert_eq!(result.records.len(), 2);
    assert_eq!(result.records[0].line, 3);
    assert_eq!(result.records[1].line, 5);

    let mismatch = result
        .problems
        .iter()
        .find(|p| matches!(p.kind, ProblemKind::TypeMismatch { .. }))
        .unwrap();
    assert_eq!(mismatch.field, "Invoice Quantity");
    assert_eq!(mismatch.line, 5);
    assert!(result.problems.iter().all(|p| p.line == 3 || p.line == 5));
}

#[test]
fn test_rejects_csv_upload() {
    let pipeline = Pipeline::new(Arc::new(TargetSchema::invoice_default())).unwrap();
    let err = pipeline.process_upload(b"a,b\n1,2\n", "invoice.csv").unwrap_err();

    assert!(matches!(err, NormalizerError::UnsupportedFormat(_)));
}

#[test]
fn test_empty_sheet_is_structural() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet();
    let bytes = workbook.save_to_buffer().unwrap();

    let err = read_workbook(&bytes, "empty.xlsx").unwrap_err();
    assert!(matches!(
        err,
        NormalizerError::Structural(StructuralError::EmptyHeaderRow)
    ));
}
