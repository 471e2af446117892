//! Application root wiring.
//!
//! One context per running frontend: it owns the token store, the shared
//! authenticated client and the toast center, and hands out the service
//! wrappers built on top of them.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::error::ApiResult;
use crate::services::{AnalyticsApi, AppointmentApi, CatalogApi, StaffApi, UserApi};
use crate::storage::KeyValueStorage;
use crate::toast::ToastCenter;
use crate::tokens::TokenStore;
use crate::transport::{HttpTransport, ReqwestTransport};

#[derive(Clone)]
pub struct SalonContext {
    pub config: ClientConfig,
    pub client: Arc<ApiClient>,
    pub toasts: ToastCenter,
    pub users: UserApi,
    pub catalog: CatalogApi,
    pub staff: StaffApi,
    pub appointments: AppointmentApi,
    pub analytics: AnalyticsApi,
}

impl SalonContext {
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
    ) -> ApiResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
        Ok(Self::with_transport(config, storage, clock, transport))
    }

    pub fn with_transport(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let tokens = TokenStore::new(storage, clock);
        let client = Arc::new(ApiClient::new(
            transport,
            tokens,
            config.user_service.clone(),
        ));

        Self {
            users: UserApi::new(client.clone(), config.user_service.clone()),
            catalog: CatalogApi::new(client.clone(), config.catalog_service.clone()),
            staff: StaffApi::new(client.clone(), config.staff_service.clone()),
            appointments: AppointmentApi::new(client.clone(), config.appointment_service.clone()),
            analytics: AnalyticsApi::new(client.clone(), config.analytics_service.clone()),
            toasts: ToastCenter::new(),
            client,
            config,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        self.client.tokens()
    }

    /// Shows `result` as a toast: `success` on `Ok`, the error's message otherwise.
    pub fn report<T>(&self, result: ApiResult<T>, success: &str) -> ApiResult<T> {
        match &result {
            Ok(_) => {
                self.toasts.success(success);
            }
            Err(e) => {
                self.toasts.error(e.user_message());
            }
        }
        result
    }
}
