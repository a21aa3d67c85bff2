use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::info;

use modal_types::api::{ExportCalculation, ExportPdfRequest, UserIdBody};

use crate::auth::{AppState, with_store};
use crate::error::ApiError;
use crate::report::{self, DEFAULT_TITLE, SINGLE_TITLE};

/// Records searched when exporting a single calculation by id.
const EXPORT_LOOKBACK: usize = 100;

fn pdf_response(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn render(
    state: &AppState,
    title: &str,
    calculations: &[ExportCalculation],
) -> Result<Vec<u8>, ApiError> {
    let today = chrono::Local::now().date_naive();
    let html = report::render_report(title, calculations, today);
    Ok(state.pdf.render(&html).await?)
}

pub async fn export_pdf(
    State(state): State<AppState>,
    payload: Result<Json<ExportPdfRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let req = payload.map(|Json(r)| r).unwrap_or_default();
    let calculations = req
        .calculations
        .ok_or_else(|| ApiError::bad_request("Calculations array is required"))?;
    let title = req.title.unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let pdf = render(&state, &title, &calculations).await?;
    info!(records = calculations.len(), bytes = pdf.len(), "PDF exported");
    Ok(pdf_response(pdf, &report::attachment_name(&title)))
}

pub async fn export_calculation(
    State(state): State<AppState>,
    Path(calculation_id): Path<String>,
    payload: Result<Json<UserIdBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let user_id = body
        .user_id
        .ok_or_else(|| ApiError::bad_request("userId is required"))?;

    let wanted = calculation_id.trim().parse::<i64>().ok();
    let history = with_store(&state, move |store| {
        store.get_calculation_history(user_id, EXPORT_LOOKBACK)
    })
    .await?;

    let record = history
        .into_iter()
        .find(|c| Some(c.id) == wanted)
        .ok_or_else(|| ApiError::not_found("Calculation not found"))?;
    let id = record.id;

    let pdf = render(&state, SINGLE_TITLE, &[record.into()]).await?;
    Ok(pdf_response(pdf, &format!("calculation_{}.pdf", id)))
}
