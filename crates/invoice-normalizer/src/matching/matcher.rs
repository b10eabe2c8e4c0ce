//! Greedy bipartite header matching.

use std::cmp::Ordering;

use tracing::debug;

use super::mapping::{
    HeaderAssignment, HeaderMapping, MappingSuggestion, MappingWarning, MatchSource,
};
use super::similarity::{normalize_header, similarity};
use crate::schema::TargetSchema;

/// Default acceptance threshold for a header/field pair.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 0.6;

/// Matcher configuration.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Pairs scoring below this are never assigned.
    pub acceptance_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

/// A scored (header, field) pair.
#[derive(Debug, Clone)]
struct Candidate {
    header: usize,
    field: usize,
    score: f64,
    alias: Option<String>,
    source: MatchSource,
}

/// Maps discovered headers onto canonical fields.
#[derive(Debug, Clone, Default)]
pub struct HeaderMatcher {
    config: MatcherConfig,
}

impl HeaderMatcher {
    /// Create a matcher with the default threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a matcher with custom configuration.
    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Minimum similarity a header needs to be assigned.
    pub fn threshold(&self) -> f64 {
        self.config.acceptance_threshold
    }

    /// Build a mapping for `headers`. Never fails; the result may be partial.
    pub fn match_headers(&self, headers: &[String], schema: &TargetSchema) -> HeaderMapping {
        let candidates = score_candidates(headers, schema);

        let mut mapping = HeaderMapping {
            assignments: headers
                .iter()
                .enumerate()
                .map(|(i, h)| HeaderAssignment::unassigned(i, h.as_str()))
                .collect(),
            ignored_headers: Vec::new(),
            missing_fields: Vec::new(),
            unmapped_fields: Vec::new(),
            warnings: Vec::new(),
            threshold: self.threshold(),
        };

        self.assign(&mut mapping, candidates.clone(), schema);
        refresh(&mut mapping, schema);
        mapping.warnings = low_confidence_warnings(&mapping, &candidates, schema, headers);
        mapping
    }

    /// Merge advisor suggestions into an existing mapping.
    ///
    /// Suggestions are candidates like any other: they only touch headers and
    /// fields that are still unassigned, must clear the threshold, and follow
    /// the same tie-break order. Suggestions naming unknown headers or fields
    /// are dropped.
    pub fn merge_suggestions(
        &self,
        mapping: &mut HeaderMapping,
        suggestions: &[MappingSuggestion],
        schema: &TargetSchema,
    ) -> usize {
        let candidates: Vec<Candidate> = suggestions
            .iter()
            .filter_map(|s| suggestion_candidate(mapping, s, schema))
            .collect();

        let assigned = self.assign(mapping, candidates, schema);
        refresh(mapping, schema);
        let still_missing = mapping.missing_fields.clone();
        mapping
            .warnings
            .retain(|w| still_missing.iter().any(|f| f == w.field()));
        assigned
    }

    /// Greedy best-match over `candidates`; returns the number of new
    /// assignments.
    fn assign(
        &self,
        mapping: &mut HeaderMapping,
        mut candidates: Vec<Candidate>,
        schema: &TargetSchema,
    ) -> usize {
        let threshold = self.threshold();
        candidates.retain(|c| c.score >= threshold);
        candidates.sort_by(compare_candidates);

        let mut field_taken: Vec<bool> = schema
            .fields
            .iter()
            .map(|f| mapping.assignment_for(&f.name).is_some())
            .collect();

        let mut assigned = 0;
        for candidate in candidates {
            if field_taken[candidate.field] || mapping.assignments[candidate.header].is_assigned() {
                continue;
            }

            let field = &schema.fields[candidate.field];
            let slot = &mut mapping.assignments[candidate.header];
            debug!(
                header = %slot.header,
                field = %field.name,
                score = candidate.score,
                source = ?candidate.source,
                "assigned header"
            );

            slot.field = Some(field.name.clone());
            slot.score = candidate.score;
            slot.source = Some(candidate.source);
            slot.matched_alias = candidate.alias;
            field_taken[candidate.field] = true;
            assigned += 1;
        }
        assigned
    }
}

/// Score descending, then field declaration order, then header position.
fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.field.cmp(&b.field))
        .then(a.header.cmp(&b.header))
}

/// Score every (header, field) pair by its best alias.
fn score_candidates(headers: &[String], schema: &TargetSchema) -> Vec<Candidate> {
    let normalized_headers: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let normalized_fields: Vec<Vec<(String, &str)>> = schema
        .fields
        .iter()
        .map(|f| {
            f.match_names()
                .map(|name| (normalize_header(name), name))
                .collect()
        })
        .collect();

    let mut candidates = Vec::with_capacity(headers.len() * schema.fields.len());
    for (h_idx, header) in normalized_headers.iter().enumerate() {
        for (f_idx, aliases) in normalized_fields.iter().enumerate() {
            let mut best: Option<(f64, &str)> = None;
            for (alias_norm, alias) in aliases {
                let score = similarity(header, alias_norm);
                if best.is_none_or(|(s, _)| score > s) {
                    best = Some((score, *alias));
                }
            }
            if let Some((score, alias)) = best {
                candidates.push(Candidate {
                    header: h_idx,
                    field: f_idx,
                    score,
                    alias: Some(alias.to_string()),
                    source: MatchSource::Similarity,
                });
            }
        }
    }
    candidates
}

fn suggestion_candidate(
    mapping: &HeaderMapping,
    suggestion: &MappingSuggestion,
    schema: &TargetSchema,
) -> Option<Candidate> {
    if !suggestion.confidence.is_finite() {
        return None;
    }

    let field = schema
        .fields
        .iter()
        .position(|f| f.name == suggestion.field || f.display_name() == suggestion.field)?;

    let wanted = normalize_header(&suggestion.header);
    let header = mapping
        .unassigned_headers()
        .find(|a| a.header == suggestion.header)
        .or_else(|| {
            mapping
                .unassigned_headers()
                .find(|a| !wanted.is_empty() && normalize_header(&a.header) == wanted)
        })?
        .index;

    Some(Candidate {
        header,
        field,
        score: suggestion.confidence.clamp(0.0, 1.0),
        alias: None,
        source: MatchSource::Advisor,
    })
}

/// Recompute the derived lists after assignments change.
fn refresh(mapping: &mut HeaderMapping, schema: &TargetSchema) {
    mapping.ignored_headers = mapping
        .unassigned_headers()
        .map(|a| a.header.clone())
        .collect();

    let unmapped: Vec<&crate::schema::FieldSpec> = schema
        .fields
        .iter()
        .filter(|f| mapping.assignment_for(&f.name).is_none())
        .collect();

    mapping.missing_fields = unmapped
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name.clone())
        .collect();
    mapping.unmapped_fields = unmapped.iter().map(|f| f.name.clone()).collect();
}

/// Warn about missing required fields whose best header fell short of the
/// threshold.
fn low_confidence_warnings(
    mapping: &HeaderMapping,
    candidates: &[Candidate],
    schema: &TargetSchema,
    headers: &[String],
) -> Vec<MappingWarning> {
    mapping
        .missing_fields
        .iter()
        .filter_map(|name| {
            let field = schema.field_index(name)?;
            let best = candidates
                .iter()
                .filter(|c| c.field == field)
                .min_by(|a, b| compare_candidates(a, b))?;
            (best.score > 0.0 && best.score < mapping.threshold).then(|| {
                MappingWarning::LowConfidenceMapping {
                    field: name.clone(),
                    best_header: headers[best.header].clone(),
                    score: best.score,
                    threshold: mapping.threshold,
                }
            })
        })
        .collect()
}
