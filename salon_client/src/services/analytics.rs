use std::sync::Arc;
use url::Url;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{BusinessInsights, DateRange, RevenueSummary, ServicePopularity, StaffPerformance};
use crate::transport::RequestOptions;

/// Reports for the admin dashboard.
#[derive(Clone)]
pub struct AnalyticsApi {
    client: Arc<ApiClient>,
    base: Url,
}

impl AnalyticsApi {
    pub fn new(client: Arc<ApiClient>, base: Url) -> Self {
        Self { client, base }
    }

    pub async fn revenue(&self, range: DateRange) -> ApiResult<RevenueSummary> {
        let mut options = RequestOptions::get();
        options.query.extend(range.query());
        self.client
            .fetch_json(&self.base, "/reports/revenue", options)
            .await
    }

    pub async fn popular_services(&self, limit: u32) -> ApiResult<Vec<ServicePopularity>> {
        let options = RequestOptions::get().with_query("limit", limit);
        self.client
            .fetch_json(&self.base, "/reports/popular-services", options)
            .await
    }

    pub async fn staff_performance(&self, range: DateRange) -> ApiResult<Vec<StaffPerformance>> {
        let mut options = RequestOptions::get();
        options.query.extend(range.query());
        self.client
            .fetch_json(&self.base, "/reports/staff-performance", options)
            .await
    }

    pub async fn insights(&self) -> ApiResult<BusinessInsights> {
        self.client
            .fetch_json(&self.base, "/reports/insights", RequestOptions::get())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::services::test_support::{base, logged_in_client};
    use crate::transport::{ApiResponse, MockHttpTransport};
    use chrono::NaiveDate;
    use reqwest::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn revenue_decodes_daily_series() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|r| {
                r.url.path() == "/reports/revenue"
                    && r.url.query() == Some("start=2025-05-01&end=2025-05-31")
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::with_json(
                    StatusCode::OK,
                    &json!({
                        "total_revenue": 4250.0,
                        "appointment_count": 50,
                        "average_ticket": 85.0,
                        "daily": [{ "date": "2025-05-01", "revenue": 120.0, "appointments": 2 }]
                    }),
                ))
            });
        let analytics = AnalyticsApi::new(logged_in_client(transport), base("analytics"));

        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
        };
        let summary = analytics.revenue(range).await.unwrap();
        assert_eq!(summary.appointment_count, 50);
        assert_eq!(summary.daily[0].appointments, 2);
    }

    #[tokio::test]
    async fn malformed_report_is_a_decode_error() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::OK, "<html>maintenance</html>")));
        let analytics = AnalyticsApi::new(logged_in_client(transport), base("analytics"));

        let err = analytics.insights().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn popular_services_passes_limit() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|r| r.url.query() == Some("limit=5"))
            .times(1)
            .returning(|_| Ok(ApiResponse::with_json(StatusCode::OK, &json!([]))));
        let analytics = AnalyticsApi::new(logged_in_client(transport), base("analytics"));

        assert!(analytics.popular_services(5).await.unwrap().is_empty());
    }
}
