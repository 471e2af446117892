use axum::{routing::get, Router};

use crate::handlers::catalog_handlers::list_services;
use crate::state::AppState;

pub fn catalog_routes(state: AppState) -> Router {
    Router::new()
        .route("/services", get(list_services))
        .with_state(state)
}
