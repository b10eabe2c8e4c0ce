//! End-to-end tests for the processing pipeline.

use std::sync::Arc;

use invoice_normalizer::normalize::FieldStatus;
use invoice_normalizer::{
    CanonicalValue, FieldSpec, FieldType, HeaderMatcher, MappingWarning, NormalizerError,
    OutputFormat, Parser, Pipeline, PipelineConfig, ProblemKind, RawTable, StructuralError,
    TargetSchema, process,
};

/// Helper to build a three-field product schema.
fn product_schema() -> TargetSchema {
    TargetSchema::new(
        "products",
        vec![
            FieldSpec::new("Product Code", FieldType::String)
                .required()
                .with_aliases(["Style Code"]),
            FieldSpec::new("Quantity", FieldType::Number)
                .required()
                .with_aliases(["Qty"]),
            FieldSpec::new("Price", FieldType::Currency)
                .required()
                .with_aliases(["Unit Price"]),
        ],
    )
}

fn csv_pipeline(schema: TargetSchema) -> Pipeline {
    Pipeline::with_config(
        Arc::new(schema),
        PipelineConfig {
            output_format: OutputFormat::Csv,
            ..PipelineConfig::default()
        },
    )
    .unwrap()
}

fn client_invoice() -> RawTable {
    RawTable::from_strings(
        [
            "Invoice Number",
            "Style Code",
            "Item Description",
            "QTY",
            "Amount US$",
            "Tariff Code",
            "Remarks",
        ],
        vec![
            vec!["EXP-001", "ST-100", "Mens cotton tee", "120", "$1,440.00", "6109.10", "rush"],
            vec!["EXP-001", "ST-200", "Womens blouse", "36", "$612.50", "6206.40", ""],
            vec!["EXP-001", "ST-300", "Laptop sleeve", "10", "(25.00)", "4202.12", ""],
        ],
    )
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_scenario_aliases_map_every_field() {
    let schema = product_schema();
    let headers: Vec<String> = ["Style Code", "Qty", "Unit Price"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mapping = HeaderMatcher::new().match_headers(&headers, &schema);

    assert!(mapping.missing_fields.is_empty());
    for field in ["Product Code", "Quantity", "Price"] {
        assert!(mapping.score_for(field).unwrap() >= 0.6, "{}", field);
    }
}

#[test]
fn test_scenario_bad_number_is_reported_not_dropped() {
    let table = RawTable::from_strings(
        ["Style Code", "Qty", "Unit Price"],
        vec![vec!["A-1", "abc", "9.99"], vec!["A-2", "4", "1.00"]],
    );

    let result = process(&table, &product_schema()).unwrap();

    assert_eq!(result.records.len(), 2);
    assert_eq!(result.problems.len(), 1);
    let problem = &result.problems[0];
    assert_eq!(problem.row, 0);
    assert_eq!(problem.field, "Quantity");
    assert!(matches!(problem.kind, ProblemKind::TypeMismatch { .. }));

    let first = &result.records[0];
    assert_eq!(first.get("Product Code"), Some(&CanonicalValue::Text("A-1".into())));
    assert_eq!(first.get("Price"), Some(&CanonicalValue::Currency(9.99)));
    assert_eq!(first.status_of("Quantity"), Some(FieldStatus::Invalid));
}

#[test]
fn test_scenario_missing_required_field() {
    let schema = TargetSchema::new(
        "totals",
        vec![
            FieldSpec::new("Product Code", FieldType::String)
                .required()
                .with_aliases(["Style Code"]),
            FieldSpec::new("Total", FieldType::Currency).required(),
        ],
    );
    let table = RawTable::from_strings(
        ["Style Code", "Notes"],
        vec![vec!["A-1", "x"], vec!["A-2", "y"]],
    );

    let result = csv_pipeline(schema).process(&table).unwrap();

    assert_eq!(result.mapping.missing_fields, vec!["Total"]);
    assert_eq!(result.problems.len(), 2);
    assert!(result
        .problems
        .iter()
        .all(|p| p.field == "Total" && p.kind == ProblemKind::MissingRequiredField));

    let text = String::from_utf8(result.output).unwrap();
    assert_eq!(text, "Product Code,Total\nA-1,\nA-2,\n");
}

#[test]
fn test_scenario_better_header_wins() {
    let schema = TargetSchema::new(
        "codes",
        vec![
            FieldSpec::new("Product Code", FieldType::String)
                .required()
                .with_aliases(["Product Code", "Codes"]),
        ],
    );
    let table = RawTable::from_strings(["Code", "Product Code"], vec![vec!["X", "Y"]]);

    let result = process(&table, &schema).unwrap();

    assert_eq!(result.mapping.column_for("Product Code"), Some(1));
    assert_eq!(result.mapping.ignored_headers, vec!["Code"]);
    assert_eq!(
        result.records[0].get("Product Code"),
        Some(&CanonicalValue::Text("Y".into()))
    );
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_default_schema_end_to_end() {
    let result = csv_pipeline(TargetSchema::invoice_default())
        .process(&client_invoice())
        .unwrap();

    assert!(result.mapping.is_complete());
    assert!(result.problems.is_empty(), "{:?}", result.problems);
    assert_eq!(result.mapping.ignored_headers, vec!["Remarks"]);

    let text = String::from_utf8(result.output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "Export Invoice #,Style,Description,Invoice Quantity,Total Amount,Customs Unit of Measure,Customs Quantity,HS Code"
    );
    assert_eq!(lines[1], "EXP-001,ST-100,Mens cotton tee,120,1440.00,DOZ,10,6109.10");
    assert_eq!(lines[2], "EXP-001,ST-200,Womens blouse,36,612.50,DOZ,3,6206.40");
    assert_eq!(lines[3], "EXP-001,ST-300,Laptop sleeve,10,-25.00,NUM,10,4202.12");
}

#[test]
fn test_row_count_is_preserved() {
    let table = RawTable::from_strings(
        ["Style Code", "Qty", "Unit Price"],
        vec![
            vec!["", "", ""],
            vec!["A", "1", "1"],
            vec!["B", "x", "y"],
            vec!["C"],
        ],
    );

    let result = process(&table, &product_schema()).unwrap();

    assert_eq!(result.records.len(), table.row_count());
    assert_eq!(result.summary.rows_total, 4);
    assert_eq!(result.summary.rows_with_errors, 3);
}

#[test]
fn test_output_is_deterministic() {
    let pipeline = Pipeline::new(Arc::new(TargetSchema::invoice_default())).unwrap();

    let first = pipeline.process(&client_invoice()).unwrap();
    let second = pipeline.process(&client_invoice()).unwrap();

    assert_eq!(first.output, second.output);
    assert_eq!(first.problems, second.problems);
    assert_eq!(first.mapping, second.mapping);
}

#[test]
fn test_remapping_output_headers_is_identity() {
    let schema = TargetSchema::invoice_default();
    let result = csv_pipeline(schema.clone())
        .process(&client_invoice())
        .unwrap();

    let table = Parser::new().parse_bytes(&result.output, b',').unwrap();
    let mapping = HeaderMatcher::new().match_headers(&table.headers, &schema);

    assert!(mapping.is_complete());
    for field in &schema.fields {
        let assignment = mapping.assignment_for(&field.name).unwrap();
        assert_eq!(assignment.header, field.name);
        assert_eq!(assignment.score, 1.0);
    }
}

#[test]
fn test_low_confidence_warning_surfaces_in_result() {
    let schema = TargetSchema::new(
        "w",
        vec![FieldSpec::new("Total", FieldType::Currency).required()],
    );
    let table = RawTable::from_strings(["Tt"], vec![vec!["1"]]);

    let result = process(&table, &schema).unwrap();

    assert_eq!(result.warnings.len(), 1);
    assert!(matches!(
        &result.warnings[0],
        MappingWarning::LowConfidenceMapping { field, best_header, .. }
            if field == "Total" && best_header == "Tt"
    ));
    assert!(!result.is_clean());
}

#[test]
fn test_structural_errors() {
    let schema = product_schema();

    let no_columns = RawTable::new(Vec::new(), Vec::new());
    assert!(matches!(
        process(&no_columns, &schema),
        Err(NormalizerError::Structural(StructuralError::NoColumns))
    ));

    let blank = RawTable::from_strings(["", ""], vec![vec!["a", "b"]]);
    assert!(matches!(
        process(&blank, &schema),
        Err(NormalizerError::Structural(StructuralError::BlankHeaders(2)))
    ));
}

#[test]
fn test_report_serializes_without_output_bytes() {
    let result = process(&client_invoice(), &TargetSchema::invoice_default()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert!(json.get("output").is_none());
    assert_eq!(json["summary"]["rows_total"], 3);
    assert_eq!(json["format"], "xlsx");
}
