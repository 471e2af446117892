use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Page, PageRequest, Service, ServiceDraft};
use crate::transport::RequestOptions;

/// The salon's service catalog.
#[derive(Clone)]
pub struct CatalogApi {
    client: Arc<ApiClient>,
    base: Url,
}

impl CatalogApi {
    pub fn new(client: Arc<ApiClient>, base: Url) -> Self {
        Self { client, base }
    }

    pub async fn list(&self, page: PageRequest) -> ApiResult<Page<Service>> {
        let mut options = RequestOptions::get();
        options.query.extend(page.query());
        self.client.fetch_json(&self.base, "/services", options).await
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Service> {
        self.client
            .fetch_json(&self.base, &format!("/services/{id}"), RequestOptions::get())
            .await
    }

    pub async fn create(&self, draft: &ServiceDraft) -> ApiResult<Service> {
        draft.validate()?;
        self.client
            .fetch_json(&self.base, "/services", RequestOptions::post_json(draft)?)
            .await
    }

    pub async fn update(&self, id: Uuid, draft: &ServiceDraft) -> ApiResult<Service> {
        draft.validate()?;
        self.client
            .fetch_json(&self.base, &format!("/services/{id}"), RequestOptions::put_json(draft)?)
            .await
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        self.client
            .fetch_unit(&self.base, &format!("/services/{id}"), RequestOptions::delete())
            .await
    }
}
