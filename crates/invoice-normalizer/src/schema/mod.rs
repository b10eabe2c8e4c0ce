//! Target schema: the export department's canonical invoice layout.

mod field;
mod target;
mod types;
mod units;

pub use field::{DerivedFieldSpec, DerivedKind, FieldSpec};
pub use target::TargetSchema;
pub use types::FieldType;
pub use units::UnitTable;
