//! Schema handler.

use axum::{Json, extract::State};

use invoice_normalizer::TargetSchema;

use crate::server::state::AppState;

/// The schema uploads are normalized against.
pub async fn get_schema(State(state): State<AppState>) -> Json<TargetSchema> {
    Json(state.schema().clone())
}
