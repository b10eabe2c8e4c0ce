//! Header-to-field mapping produced by the matcher.

use serde::{Deserialize, Serialize};

/// Where an assignment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Edit-distance similarity against the field's aliases.
    Similarity,
    /// A mapping advisor's suggestion.
    Advisor,
}

/// The mapping decision for one discovered header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderAssignment {
    /// Zero-based column position in the upload.
    pub index: usize,
    /// Header text as it appeared in the upload.
    pub header: String,
    /// Canonical field this header feeds, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Confidence of the assignment (0.0 when unassigned).
    pub score: f64,
    /// How the assignment was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<MatchSource>,
    /// The alias that produced the best similarity score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_alias: Option<String>,
}

impl HeaderAssignment {
    pub(crate) fn unassigned(index: usize, header: impl Into<String>) -> Self {
        Self {
            index,
            header: header.into(),
            field: None,
            score: 0.0,
            source: None,
            matched_alias: None,
        }
    }

    /// Returns true if this header feeds a field.
    pub fn is_assigned(&self) -> bool {
        self.field.is_some()
    }
}

/// File-level, non-fatal mapping warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MappingWarning {
    /// A required field's best header scored below the acceptance threshold
    /// and was left unmapped.
    LowConfidenceMapping {
        field: String,
        best_header: String,
        score: f64,
        threshold: f64,
    },
}

impl MappingWarning {
    /// The field the warning is about.
    pub fn field(&self) -> &str {
        match self {
            MappingWarning::LowConfidenceMapping { field, .. } => field,
        }
    }

    /// Human-readable description.
    pub fn message(&self) -> String {
        match self {
            MappingWarning::LowConfidenceMapping {
                field,
                best_header,
                score,
                threshold,
            } => format!(
                "best match for required field '{}' was '{}' ({:.2} < {:.2}); left unmapped",
                field, best_header, score, threshold
            ),
        }
    }
}

/// A suggested header-to-field pairing from a mapping advisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSuggestion {
    /// Header text as it appears in the upload.
    pub header: String,
    /// Canonical field name.
    pub field: String,
    /// Advisor confidence (0.0-1.0), scored against the same threshold.
    pub confidence: f64,
}

impl MappingSuggestion {
    pub fn new(header: impl Into<String>, field: impl Into<String>, confidence: f64) -> Self {
        Self {
            header: header.into(),
            field: field.into(),
            confidence,
        }
    }
}

/// Mapping from each discovered header to zero-or-one canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMapping {
    /// One entry per discovered header, left to right.
    pub assignments: Vec<HeaderAssignment>,
    /// Headers that feed no field.
    pub ignored_headers: Vec<String>,
    /// Required fields with no mapped header, in declaration order.
    pub missing_fields: Vec<String>,
    /// All fields (required or not) with no mapped header.
    pub unmapped_fields: Vec<String>,
    /// File-level warnings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<MappingWarning>,
    /// Acceptance threshold the mapping was built with.
    pub threshold: f64,
}

impl HeaderMapping {
    /// Header assignment feeding `field`.
    pub fn assignment_for(&self, field: &str) -> Option<&HeaderAssignment> {
        self.assignments
            .iter()
            .find(|a| a.field.as_deref() == Some(field))
    }

    /// Column index feeding `field`.
    pub fn column_for(&self, field: &str) -> Option<usize> {
        self.assignment_for(field).map(|a| a.index)
    }

    /// Score of the assignment for `field`.
    pub fn score_for(&self, field: &str) -> Option<f64> {
        self.assignment_for(field).map(|a| a.score)
    }

    /// Field fed by the header at `index`.
    pub fn field_for_header(&self, index: usize) -> Option<&str> {
        self.assignments
            .get(index)
            .and_then(|a| a.field.as_deref())
    }

    /// Number of assigned headers.
    pub fn mapped_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.is_assigned()).count()
    }

    /// False when any required field is missing.
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty()
    }

    /// Headers not yet assigned to any field.
    pub fn unassigned_headers(&self) -> impl Iterator<Item = &HeaderAssignment> {
        self.assignments.iter().filter(|a| !a.is_assigned())
    }
}
