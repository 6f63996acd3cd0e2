//! Search limits.
//!
//! Loaded from the `search` section of the application configuration:
//!
//! ```yaml
//! search:
//!   default_page_size: 25
//!   max_page_size: 1000
//!   max_order_fields: 5
//! ```
//!
//! Environment variables override the file, e.g.
//! `TRACKER_SEARCH__MAX_PAGE_SIZE=200`.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

pub const CONFIG_KEY: &str = "search";
pub const ENV_PREFIX: &str = "TRACKER_";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to load search configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("invalid search configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Page size used when the caller does not pick one (default: 25)
    pub default_page_size: usize,
    /// Larger page sizes are clamped to this (default: 1000)
    pub max_page_size: usize,
    /// Maximum number of caller-supplied order keys (default: 5)
    pub max_order_fields: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 1000,
            max_order_fields: 5,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    #[must_use]
    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    #[must_use]
    pub fn with_max_order_fields(mut self, max: usize) -> Self {
        self.max_order_fields = max;
        self
    }

    /// Extract the `search` section of `figment`, falling back to defaults
    /// for missing keys.
    ///
    /// # Errors
    /// Returns `ConfigError::Figment` on malformed values and
    /// `ConfigError::Invalid` when the limits are inconsistent.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let cfg: SearchConfig = Figment::new()
            .merge(Serialized::default(CONFIG_KEY, SearchConfig::default()))
            .merge(figment)
            .extract_inner(CONFIG_KEY)
            .map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a YAML file (if given) overlaid with `TRACKER_`-prefixed
    /// environment variables (`__` separates nesting levels).
    ///
    /// # Errors
    /// See [`SearchConfig::from_figment`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid("max_page_size must be at least 1"));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(
                "default_page_size must be between 1 and max_page_size",
            ));
        }
        if self.max_order_fields == 0 {
            return Err(ConfigError::Invalid("max_order_fields must be at least 1"));
        }
        Ok(())
    }
}
