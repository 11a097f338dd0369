//! HTTP client for the Formway data API

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;

use super::auth;
use super::error::ApiError;
use super::models::{ApiErrorBody, CreateElementRequest};
use super::retry::RetryPolicy;

/// Where created elements land: database plus the path/mode query pair
#[derive(Debug, Clone)]
pub struct ElementTarget {
    pub database_id: String,
    pub path: String,
    pub mode: String,
}

/// Element creation seam, kept narrow so the import driver can be tested
/// against a scripted implementation.
#[async_trait::async_trait]
pub trait ElementApi {
    /// Create one element; retry behavior is the implementation's concern
    async fn create_element(&self, request: &CreateElementRequest) -> Result<Value, ApiError>;
}

/// Authenticated client for one Formway instance
pub struct FormwayClient {
    http: reqwest::Client,
    base_url: String,
    target: ElementTarget,
    retry: RetryPolicy,
    token: String,
}

impl FormwayClient {
    /// Authenticate and return a ready client.
    ///
    /// Token exchange failures are fatal for the whole run and are not
    /// retried.
    pub async fn connect(
        base_url: impl Into<String>,
        target: ElementTarget,
        retry: RetryPolicy,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;

        let token = auth::request_token(&http, &base_url, client_id, client_secret)
            .await
            .with_context(|| format!("Authentication against {} failed", base_url))?;
        info!("Authenticated against {}", base_url);

        Ok(Self {
            http,
            base_url,
            target,
            retry,
            token,
        })
    }

    fn elements_url(&self) -> String {
        format!(
            "{}/api/data/v6.0/db/{}/elements",
            self.base_url.trim_end_matches('/'),
            self.target.database_id
        )
    }

    async fn post_element_once(
        &self,
        request: &CreateElementRequest,
    ) -> Result<Value, ApiError> {
        let response = self
            .http
            .post(self.elements_url())
            .query(&[
                ("path", self.target.path.as_str()),
                ("mode", self.target.mode.as_str()),
            ])
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            debug!("Element created (HTTP {})", status.as_u16());
            // Some deployments answer 204 or non-JSON bodies on success
            Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
        } else {
            Err(ApiError::Http {
                status: status.as_u16(),
                message: ApiErrorBody::extract(&body),
            })
        }
    }
}

#[async_trait::async_trait]
impl ElementApi for FormwayClient {
    async fn create_element(&self, request: &CreateElementRequest) -> Result<Value, ApiError> {
        self.retry
            .run("create element", || self.post_element_once(request))
            .await
    }
}
