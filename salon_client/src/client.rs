//! Authenticated fetch with one refresh-and-retry on 401.
//!
//! Two paths reach the refresh endpoint: the proactive one in
//! [`ApiClient::get_valid_access_token`] before a request goes out, and the
//! reactive one in [`ApiClient::fetch`] after a 401. Both funnel through a
//! per-client gate so concurrent callers share a single refresh.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ApiResult, ClientError};
use crate::models::{RefreshRequest, RefreshResponse};
use crate::tokens::{TokenStore, NEAR_EXPIRY_THRESHOLD};
use crate::transport::{endpoint, ApiRequest, ApiResponse, HttpTransport, RequestOptions};

pub const REFRESH_PATH: &str = "/refresh";

pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    tokens: TokenStore,
    user_service: Url,
    refresh_gate: Mutex<()>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, tokens: TokenStore, user_service: Url) -> Self {
        Self {
            transport,
            tokens,
            user_service,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Sends a request with the bearer token attached and recovers from one 401.
    ///
    /// Any status other than 401 comes back untouched, errors included. A 401
    /// triggers at most one refresh and one retry; the retry's response is
    /// returned as-is. If no refresh is possible the original 401 is returned.
    pub async fn fetch(
        &self,
        base: &Url,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<ApiResponse> {
        let url = endpoint(base, path, &options.query)?;
        let token = self.get_valid_access_token().await;

        let request = ApiRequest {
            method: options.method.clone(),
            url: url.clone(),
            headers: build_headers(&options, token.as_deref())?,
            body: options.body.clone(),
        };
        let response = self.transport.send(request).await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if self.tokens.is_refresh_expired() || self.tokens.refresh().is_none() {
            debug!("{} {} returned 401 with no usable refresh token", options.method, url);
            self.tokens.clear();
            return Ok(response);
        }

        let fresh = match self.refresh_after(token.as_deref()).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!("Could not recover from 401 on {}: {e}", url);
                return Ok(response);
            }
        };

        debug!("Retrying {} {} with refreshed token", options.method, url);
        let retry = ApiRequest {
            method: options.method.clone(),
            url,
            headers: build_headers(&options, Some(&fresh))?,
            body: options.body,
        };
        self.transport.send(retry).await
    }

    /// [`fetch`](Self::fetch) followed by status check and JSON decoding.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        base: &Url,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.fetch(base, path, options).await?.json()
    }

    /// [`fetch`](Self::fetch) for endpoints whose success body is irrelevant.
    pub async fn fetch_unit(&self, base: &Url, path: &str, options: RequestOptions) -> ApiResult<()> {
        self.fetch(base, path, options).await?.ensure_success()?;
        Ok(())
    }

    /// Sends without touching the token store at all.
    pub async fn send_public(
        &self,
        base: &Url,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<ApiResponse> {
        let request = ApiRequest {
            url: endpoint(base, path, &options.query)?,
            headers: build_headers(&options, None)?,
            method: options.method,
            body: options.body,
        };
        self.transport.send(request).await
    }

    /// Returns a token usable right now, refreshing first if it is about to lapse.
    ///
    /// `None` means "proceed unauthenticated": there is no session, or the
    /// session could not be renewed and has been cleared.
    pub async fn get_valid_access_token(&self) -> Option<String> {
        let access = self.tokens.access()?;
        if !self.tokens.is_access_near_expiry(NEAR_EXPIRY_THRESHOLD) {
            return Some(access);
        }

        if self.tokens.is_refresh_expired() || self.tokens.refresh().is_none() {
            debug!("Access token near expiry and no refresh token left");
            self.tokens.clear();
            return None;
        }

        match self.refresh_after(Some(&access)).await {
            Ok(fresh) => Some(fresh),
            Err(e) => {
                warn!("Proactive token refresh failed: {e}");
                self.tokens.clear();
                None
            }
        }
    }

    /// Exchanges the stored refresh token for a new access token.
    pub async fn refresh_access_token(&self) -> ApiResult<String> {
        let stale = self.tokens.access();
        self.refresh_after(stale.as_deref()).await
    }

    /// Refreshes unless another caller already replaced `stale` while we waited.
    async fn refresh_after(&self, stale: Option<&str>) -> ApiResult<String> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.tokens.access() {
            if Some(current.as_str()) != stale
                && !self.tokens.is_access_near_expiry(NEAR_EXPIRY_THRESHOLD)
            {
                debug!("Token already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let result = self.exchange_refresh_token().await;
        if result.is_err() {
            self.tokens.clear();
        }
        result
    }

    async fn exchange_refresh_token(&self) -> ApiResult<String> {
        let refresh_token = self
            .tokens
            .refresh()
            .ok_or_else(|| ClientError::Refresh("no refresh token stored".to_string()))?;

        info!("Refreshing access token");
        let options = RequestOptions::post_json(&RefreshRequest { refresh_token })?;
        let response = self
            .send_public(&self.user_service, REFRESH_PATH, options)
            .await?;

        if !response.is_success() {
            return Err(ClientError::Refresh(format!(
                "refresh endpoint answered {}: {}",
                response.status,
                response.error_detail()
            )));
        }

        let refreshed: RefreshResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ClientError::Refresh(format!("unreadable refresh response: {e}")))?;
        self.tokens
            .update_access_token(&refreshed.access_token, refreshed.expires_in);
        Ok(refreshed.access_token)
    }
}

fn build_headers(options: &RequestOptions, token: Option<&str>) -> ApiResult<HeaderMap> {
    let mut headers = options.headers.clone();
    if let Some(token) = token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
    }
    if options.method != Method::GET && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(headers)
}
