use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FoodOption, NewPricingTier, PaymentMethod, PricingTier, PricingTierUpdate};
use crate::routes::AppState;
use crate::services::registration::check_quantity;
use crate::utils::error::AppError;
use crate::utils::response::{empty_success, success};

#[derive(Debug, Deserialize)]
pub struct EventParams {
    pub event_id: Uuid,
    pub food_option: Option<FoodOption>,
}

#[derive(Debug, Deserialize)]
pub struct SeedParams {
    pub event_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminTierParams {
    pub event_id: Option<Uuid>,
    pub food_option: Option<FoodOption>,
}

#[derive(Debug, Serialize)]
pub struct PricingInfo {
    pub tiers: Vec<PricingTier>,
    pub max_tickets: i32,
}

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub quantity: i32,
    pub food_option: FoodOption,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

pub async fn list_active_tiers(
    State(state): State<AppState>,
    Query(params): Query<EventParams>,
) -> Result<Response, AppError> {
    let mut tiers: Vec<PricingTier> = state
        .tiers
        .list(Some(params.event_id), params.food_option)
        .await?
        .into_iter()
        .filter(|t| t.is_active)
        .collect();
    tiers.sort_by_key(|t| (t.food_option.as_str(), t.quantity_from));

    let info = PricingInfo {
        tiers,
        max_tickets: state.max_ticket_quantity,
    };
    Ok(success(info, "Pricing tiers retrieved successfully").into_response())
}

pub async fn calculate(
    State(state): State<AppState>,
    Query(params): Query<EventParams>,
    Json(request): Json<CalculateRequest>,
) -> Result<Response, AppError> {
    check_quantity(request.quantity, state.max_ticket_quantity)?;
    let quote = state
        .pricing
        .resolve(params.event_id, request.quantity, request.food_option, request.payment_method)
        .await?;
    Ok(success(quote, "Price calculated successfully").into_response())
}

pub async fn list_tiers(
    State(state): State<AppState>,
    Query(params): Query<AdminTierParams>,
) -> Result<Response, AppError> {
    let tiers = state.tiers.list(params.event_id, params.food_option).await?;
    Ok(success(tiers, "Pricing tiers retrieved successfully").into_response())
}

pub async fn create_tier(
    State(state): State<AppState>,
    Json(tier): Json<NewPricingTier>,
) -> Result<Response, AppError> {
    let created = state.tiers.create(tier).await?;
    Ok(success(created, "Pricing tier created successfully").into_response())
}

pub async fn update_tier(
    State(state): State<AppState>,
    Path(tier_id): Path<Uuid>,
    Json(update): Json<PricingTierUpdate>,
) -> Result<Response, AppError> {
    let updated = state.tiers.update(tier_id, update).await?;
    Ok(success(updated, "Pricing tier updated successfully").into_response())
}

pub async fn create_default_tiers(
    State(state): State<AppState>,
    Query(params): Query<SeedParams>,
) -> Result<Response, AppError> {
    let created = state.tiers.create_defaults(params.event_id).await?;
    Ok(success(created, "Default pricing tiers created successfully").into_response())
}

pub async fn delete_tier(
    State(state): State<AppState>,
    Path(tier_id): Path<Uuid>,
) -> Result<Response, AppError> {
    state.tiers.delete(tier_id).await?;
    Ok(empty_success("Pricing tier deleted successfully").into_response())
}
