use axum::extract::State;
use axum::response::{IntoResponse, Response};

use super::CurrentVolunteer;
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn volunteer_summary(State(state): State<AppState>) -> Result<Response, AppError> {
    let summary = state.reporting.volunteer_summary().await?;
    Ok(success(summary, "Volunteer summary retrieved successfully").into_response())
}

pub async fn leaderboard(
    State(state): State<AppState>,
    CurrentVolunteer(volunteer): CurrentVolunteer,
) -> Result<Response, AppError> {
    let board = state.reporting.leaderboard(volunteer).await?;
    Ok(success(board, "Leaderboard retrieved successfully").into_response())
}

pub async fn event_stats(State(state): State<AppState>) -> Result<Response, AppError> {
    let stats = state.reporting.event_stats().await?;
    Ok(success(stats, "Event stats retrieved successfully").into_response())
}
