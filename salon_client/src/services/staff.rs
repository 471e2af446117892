use chrono::NaiveDate;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{AvailabilitySlot, Page, PageRequest, SlotDraft, Staff, StaffDraft};
use crate::transport::RequestOptions;

/// Staff records and their bookable slots.
#[derive(Clone)]
pub struct StaffApi {
    client: Arc<ApiClient>,
    base: Url,
}

impl StaffApi {
    pub fn new(client: Arc<ApiClient>, base: Url) -> Self {
        Self { client, base }
    }

    pub async fn list(&self, page: PageRequest) -> ApiResult<Page<Staff>> {
        let mut options = RequestOptions::get();
        options.query.extend(page.query());
        self.client.fetch_json(&self.base, "/staff", options).await
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Staff> {
        self.client
            .fetch_json(&self.base, &format!("/staff/{id}"), RequestOptions::get())
            .await
    }

    pub async fn create(&self, draft: &StaffDraft) -> ApiResult<Staff> {
        draft.validate()?;
        self.client
            .fetch_json(&self.base, "/staff", RequestOptions::post_json(draft)?)
            .await
    }

    pub async fn update(&self, id: Uuid, draft: &StaffDraft) -> ApiResult<Staff> {
        draft.validate()?;
        self.client
            .fetch_json(&self.base, &format!("/staff/{id}"), RequestOptions::put_json(draft)?)
            .await
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        self.client
            .fetch_unit(&self.base, &format!("/staff/{id}"), RequestOptions::delete())
            .await
    }

    /// Slots for one staff member on one day.
    pub async fn availability(&self, staff_id: Uuid, date: NaiveDate) -> ApiResult<Vec<AvailabilitySlot>> {
        let options = RequestOptions::get().with_query("date", date.format("%Y-%m-%d"));
        self.client
            .fetch_json(&self.base, &format!("/staff/{staff_id}/availability"), options)
            .await
    }

    pub async fn add_slot(&self, staff_id: Uuid, draft: &SlotDraft) -> ApiResult<AvailabilitySlot> {
        draft.validate()?;
        self.client
            .fetch_json(
                &self.base,
                &format!("/staff/{staff_id}/availability"),
                RequestOptions::post_json(draft)?,
            )
            .await
    }

    pub async fn remove_slot(&self, staff_id: Uuid, slot_id: Uuid) -> ApiResult<()> {
        self.client
            .fetch_unit(
                &self.base,
                &format!("/staff/{staff_id}/availability/{slot_id}"),
                RequestOptions::delete(),
            )
            .await
    }
}
