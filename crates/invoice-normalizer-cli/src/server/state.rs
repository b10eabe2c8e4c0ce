//! Application state for the web server.

use std::path::PathBuf;
use std::sync::Arc;

use invoice_normalizer::{Pipeline, TargetSchema};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Pipeline shared by all uploads; it holds no per-run state.
    pub pipeline: Arc<Pipeline>,
    /// Directory where processed files are stored.
    pub output_dir: PathBuf,
}

impl AppState {
    /// Create new application state.
    pub fn new(pipeline: Pipeline, output_dir: PathBuf) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            output_dir,
        }
    }

    pub fn schema(&self) -> &TargetSchema {
        self.pipeline.schema()
    }
}
