//! Process-wide shim settings.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional JSON file named by `OVRWRAP_CONFIG`, then individual
//! environment variables.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Names a JSON settings file.
pub const CONFIG_PATH_ENV: &str = "OVRWRAP_CONFIG";
/// Directory searched for the runtime library before the system paths.
pub const RUNTIME_DIR_ENV: &str = "LIBREV_DLL_DIR";
pub const SRGB_CORRECTION_ENV: &str = "OVRWRAP_SRGB_CORRECTION";
pub const CHAIN_LENGTH_POLICY_ENV: &str = "OVRWRAP_CHAIN_LENGTH_POLICY";
pub const LOG_FILTER_ENV: &str = "OVRWRAP_LOG";
pub const DEFAULT_REFRESH_RATE_ENV: &str = "OVRWRAP_DEFAULT_REFRESH_RATE";

/// What to do when the runtime cannot report a chain's buffer count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainLengthPolicy {
    /// Log and continue with the default length.
    #[default]
    Tolerant,
    /// Treat the failed query like any other creation failure.
    FailFast,
}

impl fmt::Display for ChainLengthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tolerant => f.write_str("tolerant"),
            Self::FailFast => f.write_str("fail-fast"),
        }
    }
}

impl FromStr for ChainLengthPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tolerant" => Ok(Self::Tolerant),
            "fail-fast" | "failfast" | "fail_fast" => Ok(Self::FailFast),
            other => Err(Error::config(format!("unknown chain length policy '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShimSettings {
    /// Promote plain 8-bit UNORM formats to their sRGB runtime equivalent on
    /// API revisions that predate explicit sRGB handling.
    pub srgb_correction: bool,
    pub chain_length_policy: ChainLengthPolicy,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub runtime_dir: Option<PathBuf>,
    /// Used when the runtime reports no usable display refresh rate.
    pub default_refresh_rate: f32,
}

impl Default for ShimSettings {
    fn default() -> Self {
        Self {
            srgb_correction: true,
            chain_length_policy: ChainLengthPolicy::Tolerant,
            log_filter: "info".to_string(),
            runtime_dir: None,
            default_refresh_rate: 90.0,
        }
    }
}

impl ShimSettings {
    /// Load settings for this process: defaults, then the optional settings
    /// file, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(SRGB_CORRECTION_ENV) {
            self.srgb_correction = parse_bool(&value);
        }
        if let Some(value) = lookup(CHAIN_LENGTH_POLICY_ENV) {
            self.chain_length_policy = value.parse()?;
        }
        if let Some(value) = lookup(LOG_FILTER_ENV) {
            if !value.trim().is_empty() {
                self.log_filter = value.trim().to_string();
            }
        }
        if let Some(value) = lookup(RUNTIME_DIR_ENV) {
            if !value.is_empty() {
                self.runtime_dir = Some(PathBuf::from(value));
            }
        }
        if let Some(value) = lookup(DEFAULT_REFRESH_RATE_ENV) {
            self.default_refresh_rate = value.trim().parse().map_err(|_| {
                Error::config(format!("{DEFAULT_REFRESH_RATE_ENV} is not a number: '{value}'"))
            })?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if !self.default_refresh_rate.is_finite() || self.default_refresh_rate <= 0.0 {
            return Err(Error::config(format!(
                "default refresh rate must be positive, got {}",
                self.default_refresh_rate
            )));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
