//! Formway REST API client
//!
//! One authentication call per run, then one element-creation call per
//! imported row, with transient failures retried under an exponential
//! backoff policy.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod retry;

pub use client::{ElementApi, ElementTarget, FormwayClient};
pub use error::ApiError;
pub use models::{
    CreateElementRequest, FieldPayload, FormLayout, GuidRef, ItemCell, ItemList, ItemRow,
    TokenResponse,
};
pub use retry::RetryPolicy;
