//! Configuration types for Xtract

use serde::{Deserialize, Serialize};

use crate::{Result, XtractError};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sanity limits applied while decoding headers
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Text output settings for the CLI
    #[serde(default)]
    pub output: OutputConfig,
}

/// Upper bounds on header values
///
/// Unbounded by default. Set lower values to refuse files whose headers
/// declare more than a caller is prepared to handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum sites per timestep
    pub max_site_count: u64,
    /// Maximum declared fields
    pub max_field_count: u32,
    /// Maximum field header length in bytes
    pub max_field_header_length: u32,
    /// Maximum elements in a single field
    pub max_field_length: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_site_count: u64::MAX,
            max_field_count: u32::MAX,
            max_field_header_length: u32::MAX,
            max_field_length: u32::MAX,
        }
    }
}

/// Delimited text output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Column delimiter
    pub delimiter: String,
    /// Digits after the decimal point
    pub precision: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            precision: 6,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| XtractError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| XtractError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if any limit is zero or the delimiter is empty
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;

        if self.output.delimiter.is_empty() {
            return Err(XtractError::ConfigError(
                "output.delimiter cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl LimitsConfig {
    /// Validate limits
    ///
    /// # Errors
    ///
    /// Returns error if any limit is zero
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("max_site_count", self.max_site_count),
            ("max_field_count", u64::from(self.max_field_count)),
            ("max_field_header_length", u64::from(self.max_field_header_length)),
            ("max_field_length", u64::from(self.max_field_length)),
        ];

        for (name, value) in checks {
            if value == 0 {
                return Err(XtractError::ConfigError(format!(
                    "limits.{name} must be > 0"
                )));
            }
        }

        Ok(())
    }

    /// Fail with `LimitExceeded` if `value` is above `limit`
    ///
    /// # Errors
    ///
    /// Returns error if the value exceeds the limit
    pub fn check(what: &'static str, value: u64, limit: u64) -> Result<()> {
        if value > limit {
            return Err(XtractError::LimitExceeded { what, value, limit });
        }
        Ok(())
    }
}
