//! Engine configuration.
//!
//! Stored as TOML at `~/.config/funnelx/config.toml` (or XDG equivalent).
//! Every key is optional:
//!
//! ```toml
//! base_event_type = "APP_LOADED"
//! event_type_field = "eventType"
//! timestamp_field = "_timestamp"
//! funnel_id_field = "eventData.funnelInfo.funnelId"
//! missing_funnel = "reject"
//! ```
//!
//! `FUNNELX_BASE_EVENT_TYPE` and `FUNNELX_MISSING_FUNNEL` override the file.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Validation error: {0}")]
    Validation(String),
}

/// What to do when the funnel store has no definition for a request's funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingFunnelPolicy {
    /// Fail the call with `MissingFunnel`.
    #[default]
    Reject,
    /// Return the sampled response unscaled.
    Bypass,
}

impl fmt::Display for MissingFunnelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::Bypass => write!(f, "bypass"),
        }
    }
}

impl std::str::FromStr for MissingFunnelPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "bypass" => Ok(Self::Bypass),
            other => Err(ConfigError::Validation(format!(
                "Unknown missing_funnel policy: '{other}'. Valid values: reject, bypass"
            ))),
        }
    }
}

/// Field names and policies used when building base-event queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrapolationConfig {
    /// Event type whose occurrences form the base population.
    pub base_event_type: String,
    pub event_type_field: String,
    /// Event-time field the approval bound is applied to.
    pub timestamp_field: String,
    /// Field carrying the funnel id on sampled events.
    pub funnel_id_field: String,
    pub missing_funnel: MissingFunnelPolicy,
}

impl Default for ExtrapolationConfig {
    fn default() -> Self {
        Self {
            base_event_type: "APP_LOADED".into(),
            event_type_field: "eventType".into(),
            timestamp_field: "_timestamp".into(),
            funnel_id_field: "eventData.funnelInfo.funnelId".into(),
            missing_funnel: MissingFunnelPolicy::Reject,
        }
    }
}

impl ExtrapolationConfig {
    /// Load configuration from the default location, then apply env overrides.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    ///
    /// - Primary: `$XDG_CONFIG_HOME/funnelx/config.toml`
    /// - Fallback: platform-specific config dir
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join("funnelx").join("config.toml"));
        }

        dirs::config_dir()
            .map(|p| p.join("funnelx").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = dotenvy::var("FUNNELX_BASE_EVENT_TYPE")
            && !val.trim().is_empty()
        {
            self.base_event_type = val.trim().to_string();
        }
        if let Ok(val) = dotenvy::var("FUNNELX_MISSING_FUNNEL") {
            self.missing_funnel = val.parse()?;
        }
        Ok(())
    }

    /// Reject empty field names; they would produce unusable base queries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("base_event_type", &self.base_event_type),
            ("event_type_field", &self.event_type_field),
            ("timestamp_field", &self.timestamp_field),
            ("funnel_id_field", &self.funnel_id_field),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} cannot be empty")));
            }
        }
        Ok(())
    }
}
