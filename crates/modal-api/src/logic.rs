use axum::{Json, extract::rejection::JsonRejection, response::IntoResponse};
use tracing::debug;

use modal_types::api::{ApiResponse, ProcessTextRequest};

use crate::error::ApiError;

pub async fn process_text(
    payload: Result<Json<ProcessTextRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let filtered = modal_logic::process_message(&req.text);
    debug!(processed = %filtered.processed, changed = !filtered.changes.is_empty(), "logic filter");
    Ok(Json(ApiResponse::data(filtered)))
}
