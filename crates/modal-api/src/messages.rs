use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::{debug, warn};

use modal_db::models::NewMessage;
use modal_logic::{FilteredMessage, process_message};
use modal_types::api::{ApiResponse, Claims, SendMessageRequest};
use modal_types::models::Message;

use crate::auth::{AppState, with_store};
use crate::error::{ApiError, parse_id};

#[derive(Debug, Serialize)]
pub struct SentMessage {
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilteredMessage>,
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    if req.content.trim().is_empty() {
        return Err(ApiError::bad_request("Message content is required"));
    }

    let (content, filter) = if req.filter {
        let filtered = process_message(&req.content);
        if let Some(err) = &filtered.error {
            warn!("logic filter passed message through unchanged: {}", err);
        }
        debug!(original = %filtered.original, processed = %filtered.processed, "message filtered");
        (filtered.processed.clone(), Some(filtered))
    } else {
        (req.content, None)
    };

    let new_message = NewMessage {
        sender_id: claims.sub,
        receiver_id: req.receiver_id,
        content,
    };
    let message = with_store(&state, move |store| store.create_message(&new_message)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(SentMessage { message, filter })),
    ))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(other_user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let other = parse_id(&other_user_id, "userId")?;
    let me = claims.sub;
    let messages = with_store(&state, move |store| store.get_messages(me, other)).await?;
    Ok(Json(ApiResponse::data(messages)))
}
