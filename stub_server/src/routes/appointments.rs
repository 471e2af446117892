use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::appointment_handlers::{book, get_appointment, my_appointments, update_status};
use crate::middleware::auth_middleware::auth_middleware;
use crate::state::AppState;

pub fn appointment_routes(state: AppState) -> Router {
    Router::new()
        .route("/appointments", post(book))
        .route("/appointments/me", get(my_appointments))
        .route("/appointments/{id}", get(get_appointment))
        .route("/appointments/{id}/status", patch(update_status))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
