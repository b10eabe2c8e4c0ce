//! Row normalization: raw cells to typed canonical records.

mod coerce;
mod normalizer;
mod problem;
mod record;

pub use coerce::{Coerced, coerce, parse_amount, parse_date, round_cents};
pub use normalizer::RowNormalizer;
pub use problem::{ProblemKind, RowProblem, line_number};
pub use record::{CanonicalRecord, CanonicalValue, FieldStatus};
