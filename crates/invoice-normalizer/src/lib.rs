//! Invoice normalizer: turns client-supplied invoice spreadsheets into the
//! export department's fixed layout.
//!
//! Client files name their columns however they like. The normalizer maps
//! those headers onto a fixed target schema by fuzzy matching, coerces every
//! row into typed canonical values, derives the customs columns, and writes a
//! standardized spreadsheet together with a complete problem report.
//!
//! # Core Principles
//!
//! - **Deterministic**: identical input and configuration give identical bytes
//! - **Nothing dropped**: every input row is emitted, problems are reported
//! - **Advisory AI**: an optional LLM only suggests, never overrides
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use invoice_normalizer::{Pipeline, TargetSchema, read_workbook};
//!
//! let bytes = std::fs::read("invoice.xlsx").unwrap();
//! let (table, _source) = read_workbook(&bytes, "invoice.xlsx").unwrap();
//!
//! let pipeline = Pipeline::new(Arc::new(TargetSchema::invoice_default())).unwrap();
//! let result = pipeline.process(&table).unwrap();
//!
//! println!("Rows: {}", result.summary.rows_total);
//! println!("Problems: {}", result.problems.len());
//! std::fs::write("processed.xlsx", &result.output).unwrap();
//! ```

pub mod customs;
pub mod error;
pub mod input;
pub mod llm;
pub mod matching;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod schema;

pub use error::{NormalizerError, Result, StructuralError};
pub use input::{CellValue, Parser, RawTable, SourceMetadata, read_workbook};
pub use llm::{LlmConfig, MappingAdvisor, MockAdvisor, OpenAiAdvisor};
pub use matching::{HeaderMapping, HeaderMatcher, MappingSuggestion, MappingWarning, MatcherConfig};
pub use normalize::{CanonicalRecord, CanonicalValue, ProblemKind, RowNormalizer, RowProblem};
pub use output::{OutputFormat, SchemaWriter, output_file_name};
pub use pipeline::{Pipeline, PipelineConfig, ProcessingResult, ProcessingSummary, process};
pub use schema::{FieldSpec, FieldType, TargetSchema, UnitTable};
