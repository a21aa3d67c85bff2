use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};

use modal_db::models::PreferencesUpdate;
use modal_types::api::{ApiResponse, SavePreferencesRequest};

use crate::auth::{AppState, with_store};
use crate::error::{ApiError, parse_id};

pub async fn get_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&user_id, "userId")?;
    let prefs = with_store(&state, move |store| store.get_user_preferences(user_id)).await?;
    Ok(Json(ApiResponse::data(prefs)))
}

pub async fn save_preferences(
    State(state): State<AppState>,
    payload: Result<Json<SavePreferencesRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let user_id = req
        .user_id
        .ok_or_else(|| ApiError::bad_request("userId is required"))?;

    let update = PreferencesUpdate {
        theme: req.theme,
        language: req.language,
        notifications: req.notifications,
        auto_save: req.auto_save,
    };
    let prefs =
        with_store(&state, move |store| store.save_user_preferences(user_id, &update)).await?;
    Ok(Json(ApiResponse::data(prefs)))
}
