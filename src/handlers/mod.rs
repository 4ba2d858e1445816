use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod checkin;
pub mod pricing;
pub mod registration;
pub mod reports;
pub mod tickets;

/// Set by the upstream auth gateway on authenticated dashboard requests.
pub const VOLUNTEER_HEADER: &str = "x-volunteer-id";

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "checkin-api",
    };

    success(payload, "Health check successful").into_response()
}

/// The volunteer acting on the request, if the gateway identified one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentVolunteer(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentVolunteer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(VOLUNTEER_HEADER) else {
            return Ok(CurrentVolunteer(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(|id| CurrentVolunteer(Some(id)))
            .ok_or_else(|| AppError::ValidationError(format!("Invalid {VOLUNTEER_HEADER} header")))
    }
}
