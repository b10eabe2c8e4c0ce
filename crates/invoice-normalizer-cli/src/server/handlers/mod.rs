//! API request handlers.

mod files;
mod process;
mod schema;

pub use files::*;
pub use process::*;
pub use schema::*;
