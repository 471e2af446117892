pub mod booking;
pub mod client;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod toast;
pub mod tokens;
pub mod transport;
pub mod validation;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use context::SalonContext;
pub use error::{ApiResult, ClientError, FieldError};
pub use toast::{Toast, ToastCenter, ToastKind};
pub use tokens::TokenStore;
