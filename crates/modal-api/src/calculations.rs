use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::info;

use modal_db::models::NewCalculation;
use modal_types::api::{ApiResponse, HistoryQuery, SaveCalculationRequest, UserIdBody};

use crate::auth::{AppState, with_store};
use crate::error::{ApiError, parse_id};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Leading digits of `raw`; anything unparseable or zero means the default.
pub fn history_limit(raw: Option<&str>) -> usize {
    let digits: String = raw
        .unwrap_or_default()
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<usize>() {
        Ok(0) | Err(_) => DEFAULT_HISTORY_LIMIT,
        Ok(n) => n,
    }
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&user_id, "userId")?;
    let limit = history_limit(query.limit.as_deref());

    let history =
        with_store(&state, move |store| store.get_calculation_history(user_id, limit)).await?;
    Ok(Json(ApiResponse::data(history)))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub async fn save_calculation(
    State(state): State<AppState>,
    payload: Result<Json<SaveCalculationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let (Some(user_id), Some(kind), Some(input), Some(result)) = (
        req.user_id,
        present(req.kind),
        present(req.input),
        present(req.result),
    ) else {
        return Err(ApiError::bad_request(
            "Missing required fields: userId, type, input, result",
        ));
    };

    let calculation = NewCalculation {
        kind,
        input,
        result,
        description: req.description.unwrap_or_default(),
    };
    let record =
        with_store(&state, move |store| store.save_calculation(user_id, &calculation)).await?;

    info!(user_id, id = record.id, "calculation saved");
    Ok(Json(ApiResponse::data(record)))
}

pub async fn delete_calculation(
    State(state): State<AppState>,
    Path(calculation_id): Path<String>,
    payload: Result<Json<UserIdBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // A bodiless DELETE reads as a missing userId.
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let user_id = body
        .user_id
        .ok_or_else(|| ApiError::bad_request("userId is required"))?;

    let Ok(id) = calculation_id.trim().parse::<i64>() else {
        return Err(ApiError::not_found("Calculation not found"));
    };

    if with_store(&state, move |store| store.delete_calculation(id, user_id)).await? {
        Ok(Json(ApiResponse::message("Calculation deleted successfully")))
    } else {
        Err(ApiError::not_found("Calculation not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_parsing() {
        assert_eq!(history_limit(None), 50);
        assert_eq!(history_limit(Some("10")), 10);
        assert_eq!(history_limit(Some("7abc")), 7);
        assert_eq!(history_limit(Some("0")), 50);
        assert_eq!(history_limit(Some("-3")), 50);
        assert_eq!(history_limit(Some("lots")), 50);
    }
}
