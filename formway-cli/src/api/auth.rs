//! OAuth2 client-credentials token exchange
//!
//! One call per run, never retried: a credential set the token endpoint
//! rejects will not get better on a second attempt, and a missing token in
//! a 2xx response is a configuration problem, not a transient one.

use log::debug;

use super::error::ApiError;
use super::models::{ApiErrorBody, TokenResponse};

/// Exchange client credentials for a bearer token
pub async fn request_token(
    http: &reqwest::Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, ApiError> {
    let url = format!("{}/api/oauth2/token", base_url.trim_end_matches('/'));
    debug!("Requesting access token from {}", url);

    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("grant_type", "client_credentials"),
    ];

    let response = http.post(&url).form(&params).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
            message: ApiErrorBody::extract(&body),
        });
    }

    let token: TokenResponse =
        serde_json::from_str(&body).map_err(|_| ApiError::MissingToken)?;
    match token.access_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::MissingToken),
    }
}
