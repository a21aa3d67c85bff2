use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use modal_db::models::NewQuizResult;
use modal_types::api::{ApiResponse, Claims, QuizResultRequest};

use crate::auth::{AppState, with_store};
use crate::error::ApiError;

pub async fn record_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<QuizResultRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    if req.total_questions <= 0 || req.score < 0 || req.score > req.total_questions {
        return Err(ApiError::bad_request(
            "score must be between 0 and total_questions",
        ));
    }

    let result = NewQuizResult {
        user_id: claims.sub,
        score: req.score,
        total_questions: req.total_questions,
        answers: req.answers,
    };
    let stored = with_store(&state, move |store| store.create_quiz_result(&result)).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(stored))))
}

pub async fn list_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let results = with_store(&state, move |store| store.get_quiz_results(user_id)).await?;
    Ok(Json(ApiResponse::data(results)))
}
