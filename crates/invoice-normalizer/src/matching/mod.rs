//! Header matching: discovered headers onto canonical fields.

mod mapping;
mod matcher;
mod similarity;

pub use mapping::{HeaderAssignment, HeaderMapping, MappingSuggestion, MappingWarning, MatchSource};
pub use matcher::{DEFAULT_ACCEPTANCE_THRESHOLD, HeaderMatcher, MatcherConfig};
pub use similarity::{header_similarity, levenshtein, normalize_header, similarity};
