//! The processing pipeline: match, normalize, derive, write.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::customs;
use crate::error::Result;
use crate::input::{RawTable, SourceMetadata, read_workbook};
use crate::llm::MappingAdvisor;
use crate::matching::{HeaderMapping, HeaderMatcher, MappingWarning, MatcherConfig};
use crate::normalize::{CanonicalRecord, ProblemKind, RowNormalizer, RowProblem};
use crate::output::{OutputFormat, SchemaWriter};
use crate::schema::TargetSchema;

/// Configuration for a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Header matching configuration.
    pub matcher: MatcherConfig,
    /// Output file format.
    pub output_format: OutputFormat,
    /// Normalize rows on the rayon pool.
    pub parallel_rows: bool,
}

/// Everything produced for one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// One canonical record per input row, in input order.
    pub records: Vec<CanonicalRecord>,
    /// How headers were mapped.
    pub mapping: HeaderMapping,
    /// Every row-level problem, by row then field order.
    pub problems: Vec<RowProblem>,
    /// File-level warnings.
    pub warnings: Vec<MappingWarning>,
    /// Summary statistics.
    pub summary: ProcessingSummary,
    /// Format of `output`.
    pub format: OutputFormat,
    /// The standardized file.
    #[serde(skip)]
    pub output: Vec<u8>,
}

/// Summary of a processing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummary {
    /// Number of data rows read.
    pub rows_total: usize,
    /// Rows with at least one problem.
    pub rows_with_errors: usize,
    /// Headers assigned to a field.
    pub fields_mapped: usize,
    /// Fields (required or not) with no header.
    pub fields_unmapped: usize,
    /// Headers that feed no field.
    pub headers_ignored: usize,
    /// Problems by kind.
    pub problems: ProblemCounts,
    /// Advisor consulted for this run, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisor: Option<String>,
}

/// Counts of problems by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemCounts {
    pub missing_required_field: usize,
    pub type_mismatch: usize,
}

impl ProblemCounts {
    pub fn total(&self) -> usize {
        self.missing_required_field + self.type_mismatch
    }

    fn add(&mut self, kind: &ProblemKind) {
        match kind {
            ProblemKind::MissingRequiredField => self.missing_required_field += 1,
            ProblemKind::TypeMismatch { .. } => self.type_mismatch += 1,
        }
    }
}

impl ProcessingResult {
    /// Returns true if no row has problems and no warning was raised.
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty() && self.warnings.is_empty()
    }
}

/// Sequences header matching, row normalization, derived columns and output
/// serialization for one table at a time.
///
/// A pipeline holds no per-run state and can be shared across threads.
pub struct Pipeline {
    schema: Arc<TargetSchema>,
    config: PipelineConfig,
    matcher: HeaderMatcher,
    normalizer: RowNormalizer,
    writer: SchemaWriter,
    advisor: Option<Arc<dyn MappingAdvisor>>,
}

impl Pipeline {
    /// Create a pipeline with default configuration.
    pub fn new(schema: Arc<TargetSchema>) -> Result<Self> {
        Self::with_config(schema, PipelineConfig::default())
    }

    /// Create a pipeline with custom configuration. Fails if the schema does
    /// not validate.
    pub fn with_config(schema: Arc<TargetSchema>, config: PipelineConfig) -> Result<Self> {
        schema.validate()?;
        let matcher = HeaderMatcher::with_config(config.matcher.clone());
        let normalizer = RowNormalizer::new().with_parallel(config.parallel_rows);
        let writer = SchemaWriter::new(config.output_format);

        Ok(Self {
            schema,
            config,
            matcher,
            normalizer,
            writer,
            advisor: None,
        })
    }

    /// Install an advisor for unmapped required fields and unknown HS codes.
    pub fn with_advisor(self, advisor: impl MappingAdvisor + 'static) -> Self {
        self.with_shared_advisor(Arc::new(advisor))
    }

    /// Install an advisor that is shared with other owners.
    pub fn with_shared_advisor(mut self, advisor: Arc<dyn MappingAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn schema(&self) -> &TargetSchema {
        &self.schema
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Only the header mapping, with the advisor consulted if installed.
    pub fn map_headers(&self, headers: &[String]) -> HeaderMapping {
        let mut mapping = self.matcher.match_headers(headers, &self.schema);
        if !mapping.is_complete() {
            self.consult_advisor(&mut mapping);
        }
        mapping
    }

    /// Process a parsed table.
    ///
    /// Fails only when the table has no usable header row. Data problems are
    /// reported in the result.
    pub fn process(&self, table: &RawTable) -> Result<ProcessingResult> {
        table.check_structure()?;
        let schema = self.schema.as_ref();

        let mapping = self.map_headers(&table.headers);

        let mut records = self.normalizer.normalize(table, &mapping, schema);
        customs::apply_derived(&mut records, schema, self.advisor.as_deref());

        let output = self.writer.write(&records, schema)?;

        let problems: Vec<RowProblem> = records
            .iter()
            .flat_map(|r| r.problems.iter().cloned())
            .collect();
        let summary = self.summarize(&records, &mapping, &problems);

        info!(
            rows = summary.rows_total,
            rows_with_errors = summary.rows_with_errors,
            missing_fields = mapping.missing_fields.len(),
            format = %self.writer.format(),
            bytes = output.len(),
            "processed table"
        );

        Ok(ProcessingResult {
            records,
            warnings: mapping.warnings.clone(),
            mapping,
            problems,
            summary,
            format: self.writer.format(),
            output,
        })
    }

    /// Read an uploaded workbook and process it.
    pub fn process_upload(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<(ProcessingResult, SourceMetadata)> {
        let (table, source) = read_workbook(bytes, file_name)?;
        let result = self.process(&table)?;
        Ok((result, source))
    }

    fn consult_advisor(&self, mapping: &mut HeaderMapping) {
        let Some(advisor) = self.advisor.as_deref() else {
            return;
        };

        let headers: Vec<String> = mapping
            .unassigned_headers()
            .filter(|a| !a.header.trim().is_empty())
            .map(|a| a.header.clone())
            .collect();
        if headers.is_empty() {
            return;
        }
        let fields: Vec<_> = mapping
            .missing_fields
            .iter()
            .filter_map(|name| self.schema.field(name))
            .collect();

        match advisor.suggest_mappings(&headers, &fields) {
            Ok(suggestions) => {
                let added = self
                    .matcher
                    .merge_suggestions(mapping, &suggestions, &self.schema);
                debug!(
                    advisor = advisor.name(),
                    suggested = suggestions.len(),
                    accepted = added,
                    "merged advisor suggestions"
                );
            }
            Err(e) => {
                warn!(advisor = advisor.name(), error = %e, "mapping advisor failed; continuing without it");
            }
        }
    }

    fn summarize(
        &self,
        records: &[CanonicalRecord],
        mapping: &HeaderMapping,
        problems: &[RowProblem],
    ) -> ProcessingSummary {
        let mut counts = ProblemCounts::default();
        for problem in problems {
            counts.add(&problem.kind);
        }

        ProcessingSummary {
            rows_total: records.len(),
            rows_with_errors: records.iter().filter(|r| !r.is_valid()).count(),
            fields_mapped: mapping.mapped_count(),
            fields_unmapped: mapping.unmapped_fields.len(),
            headers_ignored: mapping.ignored_headers.len(),
            problems: counts,
            advisor: self.advisor.as_ref().map(|a| a.name().to_string()),
        }
    }
}

/// Process `table` against `schema` with default configuration.
pub fn process(table: &RawTable, schema: &TargetSchema) -> Result<ProcessingResult> {
    Pipeline::new(Arc::new(schema.clone()))?.process(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NormalizerError, StructuralError};
    use crate::llm::MockAdvisor;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_pipeline_is_send_sync() {
        assert_send_sync::<Pipeline>();
    }

    #[test]
    fn test_invalid_schema_is_rejected_at_construction() {
        let mut schema = TargetSchema::invoice_default();
        schema.date_formats.clear();
        assert!(matches!(
            Pipeline::new(Arc::new(schema)),
            Err(NormalizerError::Config(_))
        ));

        let schema = TargetSchema::invoice_default()
            .with_output_columns(["Export Invoice #", "Export Invoice #"]);
        let table = RawTable::from_strings(["Invoice No"], vec![vec!["INV-1"]]);
        assert!(matches!(
            process(&table, &schema),
            Err(NormalizerError::Config(_))
        ));
    }

    #[test]
    fn test_oversized_amount_is_a_type_mismatch() {
        let table = RawTable::from_strings(
            ["Invoice No", "Style", "Description", "Qty", "Amount", "HS Code"],
            vec![vec!["INV-1", "S1", "Tee", "12", "1e307", "6109"]],
        );
        let result = process(&table, &TargetSchema::invoice_default()).unwrap();

        assert_eq!(result.records[0].get("Total Amount"), None);
        assert_eq!(result.summary.problems.type_mismatch, 1);
        assert_eq!(result.problems[0].field, "Total Amount");
    }

    #[test]
    fn test_blank_headers_are_structural() {
        let table = RawTable::from_strings(["", " "], vec![vec!["1", "2"]]);
        let err = process(&table, &TargetSchema::invoice_default()).unwrap_err();

        assert!(matches!(
            err,
            NormalizerError::Structural(StructuralError::BlankHeaders(2))
        ));
    }

    #[test]
    fn test_summary_counts() {
        let table = RawTable::from_strings(
            ["Invoice No", "Style", "Description", "Qty", "Amount", "HS Code", "Notes"],
            vec![
                vec!["INV-1", "S1", "Tee", "24", "$100.00", "6109", "x"],
                vec!["INV-1", "S2", "", "many", "$5", "6205", ""],
            ],
        );
        let result = process(&table, &TargetSchema::invoice_default()).unwrap();

        assert_eq!(result.summary.rows_total, 2);
        assert_eq!(result.summary.rows_with_errors, 1);
        assert_eq!(result.summary.headers_ignored, 1);
        assert_eq!(
            result.summary.problems,
            ProblemCounts {
                missing_required_field: 1,
                type_mismatch: 1
            }
        );
        assert_eq!(result.problems[0].line, 3);
        assert!(result.summary.advisor.is_none());
    }

    #[test]
    fn test_advisor_fills_missing_field() {
        let table = RawTable::from_strings(
            ["Invoice No", "Style", "Description", "Menge", "Amount", "HS Code"],
            vec![vec!["INV-1", "S1", "Tee", "12", "10", "8471"]],
        );
        let advisor = Arc::new(
            MockAdvisor::new()
                .with_suggestion("Menge", "Invoice Quantity", 0.95)
                .with_unit("8471", "kg"),
        );
        let pipeline = Pipeline::new(Arc::new(TargetSchema::invoice_default()))
            .unwrap()
            .with_shared_advisor(advisor.clone());

        let result = pipeline.process(&table).unwrap();

        assert!(result.mapping.is_complete());
        assert!(result.problems.is_empty());
        assert_eq!(advisor.mapping_calls(), 1);
        assert_eq!(advisor.unit_calls(), 1);
        assert_eq!(
            result.records[0].get("Customs Unit of Measure").and_then(|v| v.as_str()),
            Some("KG")
        );
    }

    #[test]
    fn test_failing_advisor_does_not_fail_run() {
        let table = RawTable::from_strings(["Menge"], vec![vec!["1"]]);
        let pipeline = Pipeline::new(Arc::new(TargetSchema::invoice_default()))
            .unwrap()
            .with_advisor(MockAdvisor::failing());

        let result = pipeline.process(&table).unwrap();
        assert_eq!(result.mapping.missing_fields.len(), 6);
    }

    #[test]
    fn test_advisor_not_consulted_when_complete() {
        let table = RawTable::from_strings(
            ["Invoice No", "Style", "Description", "Qty", "Amount", "HS Code"],
            Vec::<Vec<&str>>::new(),
        );
        let advisor = Arc::new(MockAdvisor::new());
        let pipeline = Pipeline::new(Arc::new(TargetSchema::invoice_default()))
            .unwrap()
            .with_shared_advisor(advisor.clone());

        let result = pipeline.process(&table).unwrap();
        assert_eq!(result.records.len(), 0);
        assert_eq!(advisor.mapping_calls(), 0);
    }
}
