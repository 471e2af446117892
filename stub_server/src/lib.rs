//! In-memory stand-in for the salon user, catalog and appointment services.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    http::{header, Method},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use routes::{appointments::appointment_routes, auth::auth_routes, catalog::catalog_routes};
use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(auth_routes(state.clone()))
        .merge(catalog_routes(state.clone()))
        .merge(appointment_routes(state))
        .layer(cors)
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, app(state)).await
}
