use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::Ticket;
use crate::routes::AppState;
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub code: String,
}

/// A repeated scan is not an error: it answers 200 with `success: false`.
#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub success: bool,
    pub message: &'static str,
    pub ticket: Ticket,
}

pub async fn check_in(
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> Result<Response, AppError> {
    run(&state, &request.code).await
}

pub async fn check_in_by_path(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    run(&state, &code).await
}

async fn run(state: &AppState, code: &str) -> Result<Response, AppError> {
    if code.trim().is_empty() {
        return Err(AppError::ValidationError("Ticket code is required".to_string()));
    }
    let outcome = state.check_in.check_in(code).await?;
    let body = CheckInResponse {
        success: outcome.is_first_check_in(),
        message: outcome.message(),
        ticket: outcome.into_ticket(),
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}
