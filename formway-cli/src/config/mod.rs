//! TOML configuration loading
//!
//! Connection and import settings live in a config file; the client secret
//! may instead come from the `FORMWAY_CLIENT_SECRET` environment variable so
//! credentials can stay out of version-controlled files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::RetryPolicy;

/// Environment variable that overrides `connection.client_secret`
pub const CLIENT_SECRET_ENV: &str = "FORMWAY_CLIENT_SECRET";

/// Top-level configuration file contents
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub import: ImportConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Remote engine coordinates and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the Formway instance, e.g. `https://forms.example.com`
    pub base_url: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Target database identifier used in the elements endpoint path
    pub database_id: String,
}

/// What gets created for each imported row
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Workflow GUID new elements are created under
    pub workflow: Uuid,
    /// Form type GUID of the created elements
    pub form_type: Uuid,
    /// `path` query parameter for the elements endpoint
    pub path: String,
    /// `mode` query parameter for the elements endpoint
    pub mode: String,
    /// Optional business entity GUID attached to every element
    #[serde(default)]
    pub business_entity: Option<Uuid>,
    /// Header of the identifier column in the data sheet. Without it, rows
    /// fall back to their 1-based position, which breaks resume if the
    /// sheet is reordered between runs.
    #[serde(default)]
    pub id_column: Option<String>,
    /// Status ledger CSV path
    #[serde(default)]
    pub ledger: Option<PathBuf>,
    /// Data sheet name override
    #[serde(default)]
    pub data_sheet: Option<String>,
    /// Nested item-list ("detail") import settings
    #[serde(default)]
    pub detail: Option<DetailConfig>,
}

/// Item-list import settings
#[derive(Debug, Clone, Deserialize)]
pub struct DetailConfig {
    /// Sheet holding the child rows
    pub sheet: String,
    /// Item list GUID on the form
    pub list_guid: Uuid,
    /// Item list name on the form
    pub list_name: String,
}

/// Backoff policy settings
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_seconds")]
    pub base_delay_seconds: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_seconds() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_seconds: default_base_delay_seconds(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_secs_f64(self.base_delay_seconds.max(0.0)),
        }
    }
}

/// Default config location under the user config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("formway-cli").join("config.toml"))
}

impl Config {
    /// Load and parse a config file, applying environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
            if !secret.is_empty() {
                config.connection.client_secret = Some(secret);
            }
        }

        Ok(config)
    }

    /// The client secret, from the config file or the environment
    pub fn client_secret(&self) -> Result<&str> {
        match self.connection.client_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(secret),
            _ => bail!(
                "No client secret configured: set connection.client_secret or the {} environment variable",
                CLIENT_SECRET_ENV
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [connection]
        base_url = "https://forms.example.com"
        client_id = "importer"
        client_secret = "hunter2"
        database_id = "db42"

        [import]
        workflow = "6a1f0000-0000-0000-0000-00000000aaaa"
        form_type = "6a1f0000-0000-0000-0000-00000000bbbb"
        path = "Imports/Invoices"
        mode = "New"
        id_column = "Invoice No"

        [retry]
        max_retries = 5
        base_delay_seconds = 0.5
    "#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.connection.base_url, "https://forms.example.com");
        assert_eq!(config.connection.database_id, "db42");
        assert_eq!(
            config.import.workflow.to_string(),
            "6a1f0000-0000-0000-0000-00000000aaaa"
        );
        assert_eq!(config.import.id_column.as_deref(), Some("Invoice No"));
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay_seconds, 0.5);
        assert!(config.import.detail.is_none());
    }

    #[test]
    fn test_retry_defaults() {
        let minimal = r#"
            [connection]
            base_url = "https://forms.example.com"
            client_id = "importer"
            database_id = "db42"

            [import]
            workflow = "6a1f0000-0000-0000-0000-00000000aaaa"
            form_type = "6a1f0000-0000-0000-0000-00000000bbbb"
            path = "p"
            mode = "m"
        "#;
        let config: Config = toml::from_str(minimal).unwrap();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_seconds, 2.0);
        assert_eq!(
            config.retry.policy().base_delay,
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_malformed_workflow_guid_is_rejected() {
        let broken = SAMPLE.replace("6a1f0000-0000-0000-0000-00000000aaaa", "not-a-guid");
        assert!(toml::from_str::<Config>(&broken).is_err());
    }

    #[test]
    fn test_missing_client_secret_is_an_error() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.client_secret().unwrap(), "hunter2");

        let mut without = config.clone();
        without.connection.client_secret = None;
        assert!(without.client_secret().is_err());
    }
}
