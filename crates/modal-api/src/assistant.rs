use axum::{
    Extension, Json,
    extract::{Query, State, rejection::JsonRejection},
    response::IntoResponse,
};
use std::collections::HashMap;
use std::sync::MutexGuard;
use tracing::error;

use modal_assistant::{Assistant, answer, contextual_suggestions};
use modal_types::api::{ApiResponse, AssistantQueryRequest, Claims, SuggestionsQuery};

use crate::auth::AppState;
use crate::error::ApiError;

fn assistants(state: &AppState) -> Result<MutexGuard<'_, HashMap<i64, Assistant>>, ApiError> {
    state
        .assistants
        .lock()
        .map_err(|e| ApiError::Internal(format!("assistant lock poisoned: {}", e)))
}

pub async fn query(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<AssistantQueryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    if req.query.trim().is_empty() {
        return Err(ApiError::bad_request("Query is required"));
    }

    // The lock only covers the history push; answers can factor large numbers.
    assistants(&state)?
        .entry(claims.sub)
        .or_default()
        .record(&req.query, req.context);

    let query = req.query;
    let response = tokio::task::spawn_blocking(move || answer(&query))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?;
    Ok(Json(ApiResponse::data(response)))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let history = assistants(&state)?
        .get(&claims.sub)
        .map(|a| a.history().to_vec())
        .unwrap_or_default();
    Ok(Json(ApiResponse::data(history)))
}

pub async fn clear_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(assistant) = assistants(&state)?.get_mut(&claims.sub) {
        assistant.clear_history();
    }
    Ok(Json(ApiResponse::message("History cleared")))
}

pub async fn suggestions(Query(query): Query<SuggestionsQuery>) -> impl IntoResponse {
    Json(ApiResponse::data(contextual_suggestions(query.page.as_deref())))
}
