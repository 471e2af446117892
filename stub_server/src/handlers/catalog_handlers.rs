use axum::extract::{Json, Query, State};
use salon_client::models::{Page, Service};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Slices `items` the way every listing endpoint pages its results.
pub fn paginate<T>(items: Vec<T>, query: &PageQuery) -> Page<T> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(limit) as usize)
        .take(limit as usize)
        .collect();
    Page {
        items,
        total,
        page,
        limit,
    }
}

pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Json<Page<Service>> {
    let mut services: Vec<Service> = state
        .services
        .iter()
        .filter(|entry| entry.active)
        .map(|entry| entry.value().clone())
        .collect();
    services.sort_by(|a, b| a.name.cmp(&b.name));
    Json(paginate(services, &query))
}
