//! Mapping advisor trait and shared configuration.

use crate::error::Result;
use crate::matching::MappingSuggestion;
use crate::schema::FieldSpec;

/// Confidence given to advisor pairings that arrive without a score.
pub const DEFAULT_SUGGESTION_CONFIDENCE: f64 = 0.8;

/// Longest unit abbreviation accepted from an advisor.
const MAX_UNIT_LEN: usize = 5;

/// Configuration for LLM-backed advisors.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model to use (e.g., "gpt-4o").
    pub model: String,

    /// Maximum tokens in response.
    pub max_tokens: usize,

    /// Temperature for generation (0.0 keeps answers repeatable).
    pub temperature: f64,

    /// Whether to ask for header mappings.
    pub suggest_mappings: bool,

    /// Whether to ask for customs units of unknown HS codes.
    pub resolve_units: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 300,
            temperature: 0.0,
            suggest_mappings: true,
            resolve_units: true,
        }
    }
}

/// An optional collaborator consulted when deterministic matching falls short.
///
/// Implementations must be thread-safe (Send + Sync) so one advisor can be
/// shared by concurrent pipeline runs. Every answer is advisory: suggestions
/// still have to clear the matcher's threshold, and units are validated.
pub trait MappingAdvisor: Send + Sync {
    /// Suggest pairings between still-unassigned headers and still-missing
    /// fields.
    fn suggest_mappings(
        &self,
        unassigned_headers: &[String],
        missing_fields: &[&FieldSpec],
    ) -> Result<Vec<MappingSuggestion>>;

    /// Customs unit abbreviation for an HS code, if the advisor knows one.
    fn resolve_unit(&self, hs_code: &str) -> Result<Option<String>>;

    /// Get the name of this advisor (for logging/debugging).
    fn name(&self) -> &str;
}

/// Normalize an advisor's unit answer: upper-cased, 1-5 ASCII letters, or
/// `None`.
pub fn validate_unit(answer: &str) -> Option<String> {
    let unit = answer.trim().to_ascii_uppercase();
    let valid = !unit.is_empty()
        && unit.len() <= MAX_UNIT_LEN
        && unit.chars().all(|c| c.is_ascii_alphabetic());
    valid.then_some(unit)
}
