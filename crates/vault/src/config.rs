//! Configuration loading and validation for the vault service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use card_core::keys::{store::is_valid_id, DEFAULT_STORAGE_ID};
use serde::Deserialize;

/// Validated vault service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding the persisted key descriptor. **Required.**
    pub key_store_dir: String,

    /// Name of the key descriptor entry inside `key_store_dir`.
    #[serde(default = "default_key_storage_id")]
    pub key_storage_id: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP endpoint for span export. Export is disabled when unset or empty.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,
}

fn default_key_storage_id() -> String {
    DEFAULT_STORAGE_ID.into()
}
fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The OTLP endpoint, if span export is enabled.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.otel_exporter_otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.key_store_dir.trim().is_empty() {
            anyhow::bail!("KEY_STORE_DIR is required and must not be empty");
        }
        if !is_valid_id(&self.key_storage_id) {
            anyhow::bail!(
                "KEY_STORAGE_ID must be non-empty, use only [A-Za-z0-9_.-], and not start with '.'"
            );
        }
        if self.listen_port == 0 {
            anyhow::bail!("LISTEN_PORT must be > 0");
        }
        Ok(())
    }
}
