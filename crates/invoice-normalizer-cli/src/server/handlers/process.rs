//! Upload handler: process a workbook and store the standardized file.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use invoice_normalizer::input::WorkbookFormat;
use invoice_normalizer::{
    HeaderMapping, MappingWarning, ProcessingSummary, RowProblem, SourceMetadata,
    output_file_name,
};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Query parameters for an upload.
#[derive(Debug, Deserialize)]
pub struct ProcessParams {
    /// Original file name; its extension selects the workbook reader.
    pub filename: String,
}

/// Response for a processed upload.
#[derive(Serialize)]
pub struct ProcessResponse {
    /// Name of the stored output, for `GET /api/files/:name`.
    pub file: String,
    pub source: SourceMetadata,
    pub summary: ProcessingSummary,
    pub mapping: HeaderMapping,
    pub problems: Vec<RowProblem>,
    pub warnings: Vec<MappingWarning>,
}

/// Process an uploaded workbook sent as the raw request body.
pub async fn process_upload(
    State(state): State<AppState>,
    Query(params): Query<ProcessParams>,
    body: Bytes,
) -> Result<Json<ProcessResponse>, ApiError> {
    WorkbookFormat::from_file_name(&params.filename)?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("Upload body is empty".to_string()));
    }

    // Workbook parsing and the advisor's blocking HTTP client stay off the
    // async workers.
    let pipeline = state.pipeline.clone();
    let filename = params.filename.clone();
    let (result, source) =
        tokio::task::spawn_blocking(move || pipeline.process_upload(&body, &filename))
            .await
            .map_err(|e| ApiError::Internal(format!("Processing task failed: {}", e)))??;

    let name = output_file_name(&params.filename, Local::now().naive_local(), result.format);
    let path = state.output_dir.join(&name);
    tokio::fs::write(&path, &result.output)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to store {}: {}", name, e)))?;

    info!(
        upload = %params.filename,
        stored = %name,
        rows = result.summary.rows_total,
        problems = result.problems.len(),
        "processed upload"
    );

    Ok(Json(ProcessResponse {
        file: name,
        source,
        summary: result.summary,
        mapping: result.mapping,
        problems: result.problems,
        warnings: result.warnings,
    }))
}
