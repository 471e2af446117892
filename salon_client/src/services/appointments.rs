use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{
    Appointment, AppointmentFilter, AppointmentStatus, BookingRequest, Page, PageRequest,
    StatusUpdate,
};
use crate::transport::RequestOptions;

/// Booking and appointment management.
#[derive(Clone)]
pub struct AppointmentApi {
    client: Arc<ApiClient>,
    base: Url,
}

impl AppointmentApi {
    pub fn new(client: Arc<ApiClient>, base: Url) -> Self {
        Self { client, base }
    }

    pub async fn book(&self, request: &BookingRequest) -> ApiResult<Appointment> {
        self.client
            .fetch_json(&self.base, "/appointments", RequestOptions::post_json(request)?)
            .await
    }

    /// The signed-in customer's own appointments.
    pub async fn mine(&self, page: PageRequest) -> ApiResult<Page<Appointment>> {
        let mut options = RequestOptions::get();
        options.query.extend(page.query());
        self.client
            .fetch_json(&self.base, "/appointments/me", options)
            .await
    }

    /// Every appointment matching `filter`. Admin only on the server side.
    pub async fn list(&self, filter: &AppointmentFilter, page: PageRequest) -> ApiResult<Page<Appointment>> {
        let mut options = RequestOptions::get();
        options.query.extend(filter.query());
        options.query.extend(page.query());
        self.client.fetch_json(&self.base, "/appointments", options).await
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Appointment> {
        self.client
            .fetch_json(&self.base, &format!("/appointments/{id}"), RequestOptions::get())
            .await
    }

    pub async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> ApiResult<Appointment> {
        self.client
            .fetch_json(
                &self.base,
                &format!("/appointments/{id}/status"),
                RequestOptions::patch_json(&StatusUpdate { status })?,
            )
            .await
    }

    pub async fn cancel(&self, id: Uuid) -> ApiResult<Appointment> {
        self.update_status(id, AppointmentStatus::Cancelled).await
    }
}
