use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::handlers::auth_handlers::{login, profile, refresh, register, update_profile};
use crate::middleware::auth_middleware::auth_middleware;
use crate::state::AppState;

pub fn auth_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/profile", get(profile).put(update_profile))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .merge(protected)
        .with_state(state)
}
