use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{SortOrder, TicketQuery, TicketSort};
use crate::models::FoodOption;
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{paginated, success, PaginationMeta};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct TicketListParams {
    pub checked_in: Option<bool>,
    pub search: Option<String>,
    pub food_option: Option<FoodOption>,
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub sort: TicketSort,
    #[serde(default)]
    pub order: SortOrder,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TicketListParams {
    fn into_query(self) -> Result<TicketQuery, AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(AppError::ValidationError(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(AppError::ValidationError("offset must not be negative".to_string()));
        }

        Ok(TicketQuery {
            checked_in: self.checked_in,
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            food_option: self.food_option,
            created_by: self.created_by,
            sort: self.sort,
            order: self.order,
            limit,
            offset,
        })
    }
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Query(params): Query<TicketListParams>,
) -> Result<Response, AppError> {
    let query = params.into_query()?;
    let (tickets, total) = state.tickets.search_tickets(&query).await?;
    let meta = PaginationMeta::new(total, query.limit, query.offset);
    Ok(paginated(tickets, meta).into_response())
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let ticket = state.check_in.lookup(&code).await?;
    Ok(success(ticket, "Ticket retrieved successfully").into_response())
}
