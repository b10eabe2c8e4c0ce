//! Download handler for stored outputs.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use invoice_normalizer::OutputFormat;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Download a processed file by the name returned from an upload.
pub async fn download_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(ApiError::BadRequest(format!("Invalid file name: {}", name)));
    }
    let format = OutputFormat::from_file_name(&name)
        .ok_or_else(|| ApiError::NotFound(format!("No processed file named {}", name)))?;

    let bytes = match tokio::fs::read(state.output_dir.join(&name)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("No processed file named {}", name)));
        }
        Err(e) => return Err(ApiError::Internal(format!("Failed to read {}: {}", name, e))),
    };

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        bytes,
    )
        .into_response())
}
