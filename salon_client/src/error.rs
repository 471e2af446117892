use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ClientError>;

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("request failed ({status}): {detail}")]
    Http { status: StatusCode, detail: String },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("token refresh failed: {0}")]
    Refresh(String),

    #[error("invalid input: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("booking error: {0}")]
    Booking(String),

    #[error("not allowed: {0}")]
    PermissionDenied(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Status code of a failed HTTP exchange, if that is what this is.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Network(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Short text suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http { detail, .. } => detail.clone(),
            ClientError::Network(_) => "Could not reach the server. Please try again.".to_string(),
            ClientError::Refresh(_) => "Your session has expired. Please log in again.".to_string(),
            other => other.to_string(),
        }
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
