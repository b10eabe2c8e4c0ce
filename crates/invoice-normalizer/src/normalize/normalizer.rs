//! Applies a header mapping to every row of a table.

use rayon::prelude::*;

use super::coerce::{Coerced, coerce};
use super::problem::RowProblem;
use super::record::{CanonicalRecord, FieldStatus};
use crate::input::RawTable;
use crate::matching::HeaderMapping;
use crate::schema::{FieldSpec, TargetSchema};

/// Converts raw rows into canonical records.
#[derive(Debug, Clone, Default)]
pub struct RowNormalizer {
    parallel: bool,
}

/// Source column for each schema field.
struct FieldPlan<'a> {
    field: &'a FieldSpec,
    column: Option<usize>,
}

impl RowNormalizer {
    /// Sequential normalizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize rows on the rayon pool. Output order is unchanged.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Produce exactly one record per input row.
    pub fn normalize(
        &self,
        table: &RawTable,
        mapping: &HeaderMapping,
        schema: &TargetSchema,
    ) -> Vec<CanonicalRecord> {
        let plan: Vec<FieldPlan<'_>> = schema
            .fields
            .iter()
            .map(|field| FieldPlan {
                field,
                column: mapping.column_for(&field.name),
            })
            .collect();

        let per_row = |row: usize| normalize_row(table, row, &plan, &schema.date_formats);

        if self.parallel {
            (0..table.row_count()).into_par_iter().map(per_row).collect()
        } else {
            (0..table.row_count()).map(per_row).collect()
        }
    }
}

fn normalize_row(
    table: &RawTable,
    row: usize,
    plan: &[FieldPlan<'_>],
    date_formats: &[String],
) -> CanonicalRecord {
    let line = table.line(row);
    let mut record = CanonicalRecord::at_line(row, line);

    for FieldPlan { field, column } in plan {
        let name = field.name.as_str();
        let Some(column) = *column else {
            if field.required {
                record.problems.push(RowProblem::missing(row, line, name, true));
                record.set(name, None, FieldStatus::Missing);
            } else {
                record.set(name, None, FieldStatus::Empty);
            }
            continue;
        };

        match coerce(table.cell(row, column), field.field_type, date_formats) {
            Coerced::Value(value) => record.set(name, Some(value), FieldStatus::Valid),
            Coerced::Empty if field.required => {
                record.problems.push(RowProblem::missing(row, line, name, false));
                record.set(name, None, FieldStatus::Missing);
            }
            Coerced::Empty => record.set(name, None, FieldStatus::Empty),
            Coerced::Invalid(raw) => {
                record
                    .problems
                    .push(RowProblem::type_mismatch(row, line, name, raw, field.field_type));
                record.set(name, None, FieldStatus::Invalid);
            }
        }
    }

    record
}
