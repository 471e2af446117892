use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::{ApiResult, ClientError};

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A response as received, body already read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        // Serializing plain data structures into a Vec cannot fail.
        let body = serde_json::to_vec(value).unwrap_or_default();
        Self::new(status, body)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Human readable failure reason, preferring the body's `detail` field.
    pub fn error_detail(&self) -> String {
        if let Ok(value) = serde_json::from_slice::<Value>(&self.body) {
            if let Some(detail) = value.get("detail") {
                return match detail {
                    Value::String(s) => s.clone(),
                    Value::Array(items) => items
                        .iter()
                        .map(|item| match item.get("msg").and_then(Value::as_str) {
                            Some(msg) => msg.to_string(),
                            None => item.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join("; "),
                    other => other.to_string(),
                };
            }
            if let Some(message) = value.get("message").and_then(Value::as_str) {
                return message.to_string();
            }
        }

        let text = self.text();
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }

        self.status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    }

    /// Passes successful responses through and turns the rest into `ClientError::Http`.
    pub fn ensure_success(self) -> ApiResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Http {
                status: self.status,
                detail: self.error_detail(),
            })
        }
    }

    pub fn json<T: DeserializeOwned>(self) -> ApiResult<T> {
        let response = self.ensure_success()?;
        Ok(serde_json::from_slice(&response.body)?)
    }
}

/// The single point where requests leave the process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

/// Caller-facing request description: method, extra headers, query and body.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self::with_method(Method::DELETE)
    }

    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn post_json<T: Serialize + ?Sized>(body: &T) -> ApiResult<Self> {
        Self::json(Method::POST, body)
    }

    pub fn put_json<T: Serialize + ?Sized>(body: &T) -> ApiResult<Self> {
        Self::json(Method::PUT, body)
    }

    pub fn patch_json<T: Serialize + ?Sized>(body: &T) -> ApiResult<Self> {
        Self::json(Method::PATCH, body)
    }

    fn json<T: Serialize + ?Sized>(method: Method, body: &T) -> ApiResult<Self> {
        Ok(Self {
            method,
            body: Some(Bytes::from(serde_json::to_vec(body)?)),
            ..Self::default()
        })
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> ApiResult<Self> {
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }
}

/// Joins a service base URL and a path, then appends query pairs.
pub fn endpoint(base: &Url, path: &str, query: &[(String, String)]) -> ApiResult<Url> {
    let mut url = Url::parse(&format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    ))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}
