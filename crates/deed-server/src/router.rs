use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all Deed endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handler::health_handler))
        .route("/add_entry", post(handler::add_entry_handler))
        .route("/verify/:land_id", get(handler::verify_handler))
        .route("/property/:property_number", get(handler::property_history_handler))
        .route("/survey/:survey_number", get(handler::survey_history_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
