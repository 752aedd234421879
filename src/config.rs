//! Provider configuration.
//!
//! Values come from the provider block; anything left unset falls back to the
//! environment (`MC_API_KEY_ID`, `MC_API_KEY_TOKEN`, `MC_API_ENDPOINT`).

use serde::Deserialize;

use crate::schema::{Attribute, Diagnostic, Schema};

/// Default GraphQL endpoint of the platform.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.getmontecarlo.com/graphql";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Environment fallback for `api_key_id`.
pub const ENV_API_KEY_ID: &str = "MC_API_KEY_ID";
/// Environment fallback for `api_key_token`.
pub const ENV_API_KEY_TOKEN: &str = "MC_API_KEY_TOKEN";
/// Environment fallback for `api_endpoint`.
pub const ENV_API_ENDPOINT: &str = "MC_API_ENDPOINT";

/// Settings used to reach the platform's API.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Identifier of the account service key.
    #[serde(default)]
    pub api_key_id: Option<String>,
    /// Secret token of the account service key.
    #[serde(default)]
    pub api_key_token: Option<String>,
    /// GraphQL endpoint override.
    #[serde(default)]
    pub api_endpoint: Option<String>,
    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_id: None,
            api_key_token: None,
            api_endpoint: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl ProviderConfig {
    /// Parse the provider block. A `null` block yields the defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    /// Fill unset values from the process environment.
    pub fn with_env_fallback(self) -> Self {
        self.with_fallback(|name| std::env::var(name).ok())
    }

    /// Fill unset values from an arbitrary lookup.
    pub fn with_fallback<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if self.api_key_id.is_none() {
            self.api_key_id = non_empty(ENV_API_KEY_ID);
        }
        if self.api_key_token.is_none() {
            self.api_key_token = non_empty(ENV_API_KEY_TOKEN);
        }
        if self.api_endpoint.is_none() {
            self.api_endpoint = non_empty(ENV_API_ENDPOINT);
        }
        self
    }

    /// The endpoint to post GraphQL documents to.
    pub fn endpoint(&self) -> &str {
        self.api_endpoint.as_deref().unwrap_or(DEFAULT_API_ENDPOINT)
    }

    /// Check that everything needed to build a client is present.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if self.api_key_id.as_deref().map_or(true, str::is_empty) {
            diagnostics.push(
                Diagnostic::error("Missing API key id")
                    .with_detail(format!(
                        "Set 'api_key_id' in the provider configuration or the {} environment variable",
                        ENV_API_KEY_ID
                    ))
                    .with_attribute("api_key_id"),
            );
        }
        if self.api_key_token.as_deref().map_or(true, str::is_empty) {
            diagnostics.push(
                Diagnostic::error("Missing API key token")
                    .with_detail(format!(
                        "Set 'api_key_token' in the provider configuration or the {} environment variable",
                        ENV_API_KEY_TOKEN
                    ))
                    .with_attribute("api_key_token"),
            );
        }
        if self.timeout_seconds == 0 {
            diagnostics.push(
                Diagnostic::error("Invalid timeout")
                    .with_detail("'timeout_seconds' must be greater than zero")
                    .with_attribute("timeout_seconds"),
            );
        }
        diagnostics
    }

    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "api_key_id",
                Attribute::optional_string()
                    .with_description("Account service key id. Defaults to MC_API_KEY_ID."),
            )
            .with_attribute(
                "api_key_token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Account service key token. Defaults to MC_API_KEY_TOKEN."),
            )
            .with_attribute(
                "api_endpoint",
                Attribute::optional_string().with_description("GraphQL endpoint override."),
            )
            .with_attribute(
                "timeout_seconds",
                Attribute::optional_int64().with_description("Per-request timeout in seconds."),
            )
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key_id", &self.api_key_id)
            .field(
                "api_key_token",
                &self.api_key_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_endpoint", &self.api_endpoint)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}
