use axum::{Json, extract::State, response::IntoResponse};
use tracing::info;

use modal_db::{Backend, migrate_json_to_store};
use modal_types::api::ApiResponse;

use crate::auth::{AppState, with_store};
use crate::error::ApiError;

/// Copy the JSON document into the running SQLite store.
pub async fn run_migration(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if state.backend == Backend::Json {
        return Err(ApiError::bad_request(
            "Migration requires the SQLite store; the server is running on the JSON store",
        ));
    }

    let json_path = state.json_path.clone();
    info!("migration requested from {}", json_path.display());
    let report = with_store(&state, move |store| migrate_json_to_store(&json_path, store)).await?;

    Ok(Json(ApiResponse {
        success: true,
        data: Some(report),
        message: Some("Migration completed successfully".into()),
        error: None,
    }))
}
