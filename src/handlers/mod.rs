pub mod health;
pub mod schedule;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/schedule", post(schedule::create).get(schedule::list))
        .route("/schedule/avaliable-days", get(schedule::available_days))
        .route(
            "/schedule/:id",
            get(schedule::get_one)
                .put(schedule::update)
                .delete(schedule::delete),
        )
        .route("/schedule/car/:plate", get(schedule::by_license_plate))
        .route("/schedule/cpf/:cpf", get(schedule::by_cpf))
        .route("/schedule/month/:month", get(schedule::by_month))
        .route(
            "/schedule/month/:month/week/:week",
            get(schedule::by_week),
        )
        .route("/schedule/month/:month/day/:day", get(schedule::by_day))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
