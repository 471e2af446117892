use std::sync::Arc;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{
    LoginRequest, Page, PageRequest, PasswordChange, ProfileUpdate, RegisterRequest, TokenResponse,
    User,
};
use crate::transport::RequestOptions;
use crate::validation::{
    validate_login, validate_password_change, validate_profile_update, validate_registration,
};

/// Registration, login and profile on the user service.
#[derive(Clone)]
pub struct UserApi {
    client: Arc<ApiClient>,
    base: Url,
}

impl UserApi {
    pub fn new(client: Arc<ApiClient>, base: Url) -> Self {
        Self { client, base }
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<User> {
        validate_registration(request)?;
        self.client
            .send_public(&self.base, "/register", RequestOptions::post_json(request)?)
            .await?
            .json()
    }

    /// Logs in and stores the issued token pair.
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<TokenResponse> {
        validate_login(request)?;
        let tokens: TokenResponse = self
            .client
            .send_public(&self.base, "/login", RequestOptions::post_json(request)?)
            .await?
            .json()?;

        self.client.tokens().set_login_tokens(
            &tokens.access_token,
            &tokens.refresh_token,
            tokens.expires_in,
        );
        info!("Logged in as {}", request.email);
        Ok(tokens)
    }

    pub fn logout(&self) {
        self.client.tokens().clear();
        info!("Logged out");
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.tokens().has_session()
    }

    pub async fn profile(&self) -> ApiResult<User> {
        self.client
            .fetch_json(&self.base, "/profile", RequestOptions::get())
            .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<User> {
        validate_profile_update(update)?;
        self.client
            .fetch_json(&self.base, "/profile", RequestOptions::put_json(update)?)
            .await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> ApiResult<()> {
        validate_password_change(change)?;
        self.client
            .fetch_unit(&self.base, "/profile/password", RequestOptions::post_json(change)?)
            .await
    }

    pub async fn list_customers(&self, page: PageRequest) -> ApiResult<Page<User>> {
        let mut options = RequestOptions::get().with_query("role", "customer");
        options.query.extend(page.query());
        self.client.fetch_json(&self.base, "/users", options).await
    }

    pub async fn delete_customer(&self, id: Uuid) -> ApiResult<()> {
        self.client
            .fetch_unit(&self.base, &format!("/users/{id}"), RequestOptions::delete())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::services::test_support::{base, logged_in_client, T0};
    use crate::transport::{ApiResponse, MockHttpTransport};
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn login_stores_tokens_and_skips_auth_header() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|r| {
                r.method == Method::POST
                    && r.url.as_str() == "http://users.test/login"
                    && !r.headers.contains_key(reqwest::header::AUTHORIZATION)
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::with_json(
                    StatusCode::OK,
                    &json!({
                        "access_token": "fresh-access",
                        "refresh_token": "fresh-refresh",
                        "token_type": "bearer",
                        "expires_in": 600,
                        "refresh_expires_in": 604800
                    }),
                ))
            });
        let client = logged_in_client(transport);
        let users = UserApi::new(client.clone(), base("users"));

        users
            .login(&LoginRequest {
                email: "ada@example.com".into(),
                password: "engine42".into(),
            })
            .await
            .unwrap();

        let tokens = client.tokens();
        assert_eq!(tokens.access().as_deref(), Some("fresh-access"));
        assert_eq!(tokens.refresh().as_deref(), Some("fresh-refresh"));
        assert_eq!(tokens.access_expires_at(), Some(T0 + 600_000));
        // Server-supplied refresh lifetime is ignored.
        assert_eq!(tokens.refresh_expires_at(), Some(T0 + 86_400_000));
    }

    #[tokio::test]
    async fn failed_login_keeps_existing_session_and_reports_detail() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(ApiResponse::with_json(
                StatusCode::UNAUTHORIZED,
                &json!({ "detail": "Invalid email or password" }),
            ))
        });
        let client = logged_in_client(transport);
        let users = UserApi::new(client.clone(), base("users"));

        let err = users
            .login(&LoginRequest {
                email: "ada@example.com".into(),
                password: "wrong-pass1".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Invalid email or password");
        assert_eq!(client.tokens().access().as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn invalid_registration_never_hits_the_network() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(0);
        let users = UserApi::new(logged_in_client(transport), base("users"));

        let err = users
            .register(&RegisterRequest {
                name: "Ada".into(),
                email: "not-an-email".into(),
                password: "engine42".into(),
                phone: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn customers_are_listed_with_role_and_paging() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|r| r.url.as_str() == "http://users.test/users?role=customer&page=2&limit=25")
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::with_json(
                    StatusCode::OK,
                    &json!({ "items": [], "total": 30, "page": 2, "limit": 25 }),
                ))
            });
        let users = UserApi::new(logged_in_client(transport), base("users"));

        let page = users.list_customers(PageRequest::new(2, 25)).await.unwrap();
        assert_eq!(page.total_pages(), 2);
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let users = UserApi::new(logged_in_client(MockHttpTransport::new()), base("users"));
        assert!(users.is_logged_in());
        users.logout();
        assert!(!users.is_logged_in());
    }
}
