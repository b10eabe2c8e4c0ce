//! Output serialization in the receiving department's layout.

mod format;
mod writer;

pub use format::{OutputFormat, output_file_name};
pub use writer::SchemaWriter;
