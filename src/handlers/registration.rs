use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::CurrentVolunteer;
use crate::routes::AppState;
use crate::services::RegistrationRequest;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn register(
    State(state): State<AppState>,
    CurrentVolunteer(volunteer): CurrentVolunteer,
    Json(request): Json<RegistrationRequest>,
) -> Result<Response, AppError> {
    let summary = state.registration.register(request, volunteer).await?;
    Ok(success(summary, "Registration successful").into_response())
}
