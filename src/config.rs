//! Composer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DESCRIPTION_FORMAT, DEFAULT_MAX_SEARCH_QUERY_LENGTH, ENV_PREFIX};
use crate::error::ComposerError;

/// Settings applied to every composition.
///
/// Usually loaded from a `composer.toml` file:
///
/// ```toml
/// default_description_format = "%{job_name} - %{template_name}"
/// max_search_query_length = 1024
/// default_execution_timeout_interval = 3600
/// ```
///
/// # Defaults
///
/// | Setting                              | Default              |
/// |--------------------------------------|----------------------|
/// | `default_description_format`         | `"%{template_name}"` |
/// | `max_search_query_length`            | 4096                 |
/// | `default_execution_timeout_interval` | none                 |
///
/// # Examples
///
/// ```
/// use invocation_composer::config::ComposerConfig;
///
/// let config = ComposerConfig::from_toml("max_search_query_length = 64").unwrap();
/// assert_eq!(config.max_search_query_length, 64);
/// assert_eq!(config.default_description_format, "%{template_name}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Description format used when the request carries none.
    #[serde(default = "default_description_format")]
    pub default_description_format: String,

    /// Longest ad-hoc search query accepted, in characters.
    #[serde(default = "default_max_search_query_length")]
    pub max_search_query_length: usize,

    /// Execution timeout (seconds) applied when the request carries none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_execution_timeout_interval: Option<u64>,
}

fn default_description_format() -> String {
    DEFAULT_DESCRIPTION_FORMAT.to_string()
}

fn default_max_search_query_length() -> usize {
    DEFAULT_MAX_SEARCH_QUERY_LENGTH
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            default_description_format: default_description_format(),
            max_search_query_length: default_max_search_query_length(),
            default_execution_timeout_interval: None,
        }
    }
}

impl ComposerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ComposerError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ComposerError> {
        toml::from_str(content).map_err(Into::into)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ComposerError> {
        toml::to_string_pretty(self).map_err(|e| ComposerError::Config(e.to_string()))
    }

    /// Load configuration from environment variables, starting from the
    /// defaults.
    ///
    /// - `INVOCATION_COMPOSER_DESCRIPTION_FORMAT`
    /// - `INVOCATION_COMPOSER_MAX_SEARCH_QUERY_LENGTH`
    /// - `INVOCATION_COMPOSER_EXECUTION_TIMEOUT_INTERVAL`
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub(crate) fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut config = Self::default();

        for (key, value) in vars {
            let Some(setting) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match setting {
                "DESCRIPTION_FORMAT" => config.default_description_format = value,
                "MAX_SEARCH_QUERY_LENGTH" => match value.parse() {
                    Ok(max) => config.max_search_query_length = max,
                    Err(_) => tracing::warn!(key = %key, value = %value, "ignoring non-numeric setting"),
                },
                "EXECUTION_TIMEOUT_INTERVAL" => match value.parse() {
                    Ok(secs) => config.default_execution_timeout_interval = Some(secs),
                    Err(_) => tracing::warn!(key = %key, value = %value, "ignoring non-numeric setting"),
                },
                _ => tracing::debug!(key = %key, "unknown composer setting"),
            }
        }

        config
    }

    /// Set the default description format.
    #[must_use]
    pub fn with_description_format(mut self, format: impl Into<String>) -> Self {
        self.default_description_format = format.into();
        self
    }

    /// Set the maximum search query length.
    #[must_use]
    pub fn with_max_search_query_length(mut self, max: usize) -> Self {
        self.max_search_query_length = max;
        self
    }

    /// Set the default execution timeout in seconds.
    #[must_use]
    pub fn with_execution_timeout_interval(mut self, secs: u64) -> Self {
        self.default_execution_timeout_interval = Some(secs);
        self
    }
}
