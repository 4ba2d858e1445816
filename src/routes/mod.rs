use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{
    create_cors_layer, create_security_headers_layer, HttpConfig, PricingConfig, RegistrationConfig, ReportingConfig,
};
use crate::db::{EventRepository, PricingRepository, TicketRepository, VolunteerRepository};
use crate::handlers::{checkin, health_check, pricing, registration, reports, tickets};
use crate::notify::{NotificationDispatcher, Notifier};
use crate::services::{CheckInService, PricingResolver, RegistrationCoordinator, ReportingViews, TicketCodeIssuer, TierAdmin};
use crate::storage::ObjectStorage;

/// Shared by every handler. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<RegistrationCoordinator>,
    pub check_in: Arc<CheckInService>,
    pub pricing: Arc<PricingResolver>,
    pub tiers: Arc<TierAdmin>,
    pub reporting: Arc<ReportingViews>,
    pub tickets: Arc<dyn TicketRepository>,
    pub max_ticket_quantity: i32,
}

impl AppState {
    /// Wires the services over one datastore and the given collaborators.
    pub fn new<D>(
        store: Arc<D>,
        storage: Arc<dyn ObjectStorage>,
        notifier: Arc<dyn Notifier>,
        pricing_config: &PricingConfig,
        registration: RegistrationConfig,
        reporting: ReportingConfig,
    ) -> Self
    where
        D: EventRepository + PricingRepository + TicketRepository + VolunteerRepository + 'static,
    {
        let notifications = NotificationDispatcher::new(notifier);
        let pricing = Arc::new(PricingResolver::new(store.clone(), &registration));
        let issuer = Arc::new(TicketCodeIssuer::new(storage));
        let max_ticket_quantity = registration.max_ticket_quantity;

        Self {
            registration: Arc::new(RegistrationCoordinator::new(
                registration,
                store.clone(),
                pricing.clone(),
                issuer,
                store.clone(),
                notifications.clone(),
            )),
            check_in: Arc::new(CheckInService::new(store.clone(), notifications)),
            pricing,
            tiers: Arc::new(TierAdmin::new(store.clone(), pricing_config)),
            reporting: Arc::new(ReportingViews::new(store.clone(), store.clone(), reporting)),
            tickets: store,
            max_ticket_quantity,
        }
    }
}

pub fn create_routes(state: AppState, http: &HttpConfig) -> Router {
    let api = Router::new()
        .route("/register", post(registration::register))
        .route("/checkin", post(checkin::check_in))
        .route("/checkin/:code", post(checkin::check_in_by_path))
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/:code", get(tickets::get_ticket))
        .route("/pricing/tiers", get(pricing::list_active_tiers))
        .route("/pricing/calculate", post(pricing::calculate))
        .route("/pricing/admin/tiers", get(pricing::list_tiers).post(pricing::create_tier))
        .route("/pricing/admin/create-default-tiers", post(pricing::create_default_tiers))
        .route(
            "/pricing/admin/tiers/:id",
            put(pricing::update_tier).delete(pricing::delete_tier),
        )
        .route("/volunteers/summary", get(reports::volunteer_summary))
        .route("/volunteers/leaderboard", get(reports::leaderboard))
        .route("/stats", get(reports::event_stats));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(http.include_hsts))
        .layer(create_cors_layer(&http.allowed_origins))
}
