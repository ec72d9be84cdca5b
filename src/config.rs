//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `artgrab.toml`. Stock defaults
//! are the base layer; a user file overrides only the keys it names, and
//! command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [probe]
//! concurrency = 6           # Max simultaneous in-flight probes
//! timeout_ms = 8000         # Per-candidate upper bound
//! user_agent = "artgrab/0.1"
//! max_bytes = 33554432      # Largest response body accepted (32 MiB)
//!
//! [trim]
//! enabled = true            # Remove uniform dark borders before archiving
//! threshold = 30            # Channel value (0-255) at or below which a pixel is blank
//! quality = 95              # JPEG quality for trimmed output (1-100)
//!
//! [archive]
//! prefix = "artgrab"        # Leading component of every output filename
//! fallback_proxies = []     # Proxy URL templates tried after a direct fetch fails
//!
//! # Replaces the built-in strategy catalog when present.
//! [[strategies]]
//! name = "boxart"
//! source = "titlecdn"
//! type = "poster"
//! templates = ["https://art.titlecdn.net/boxart/{id}/{variant}.jpg"]
//! variants = [{ tag = "large", width = 665, height = 935 }]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::strategy::{Strategy, default_strategies, validate_strategies};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Name of the config file looked up in the config directory.
pub const CONFIG_FILENAME: &str = "artgrab.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `artgrab.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Probe fan-out and HTTP settings.
    pub probe: ProbeConfig,
    /// Border-trim settings.
    pub trim: TrimConfig,
    /// Output naming and fetch fallback.
    pub archive: ArchiveConfig,
    /// Strategy catalog override. `None` selects the built-in catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategies: Option<Vec<Strategy>>,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.concurrency == 0 || self.probe.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::Validation(format!(
                "probe.concurrency must be 1-{MAX_CONCURRENCY}"
            )));
        }
        if self.probe.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "probe.timeout_ms must be non-zero".into(),
            ));
        }
        if self.probe.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "probe.max_bytes must be non-zero".into(),
            ));
        }
        if self.trim.quality == 0 || self.trim.quality > 100 {
            return Err(ConfigError::Validation("trim.quality must be 1-100".into()));
        }
        if self.archive.prefix.is_empty() {
            return Err(ConfigError::Validation(
                "archive.prefix must not be empty".into(),
            ));
        }
        if let Some(p) = self
            .archive
            .fallback_proxies
            .iter()
            .find(|p| !p.contains("{url}"))
        {
            return Err(ConfigError::Validation(format!(
                "archive.fallback_proxies entry {p:?} lacks {{url}}"
            )));
        }
        if let Some(strategies) = &self.strategies {
            validate_strategies(strategies).map_err(ConfigError::Validation)?;
        }
        Ok(())
    }

    /// The active strategy catalog.
    pub fn strategies(&self) -> Vec<Strategy> {
        self.strategies.clone().unwrap_or_else(default_strategies)
    }
}

/// Upper bound for `probe.concurrency`.
pub const MAX_CONCURRENCY: usize = 64;

/// Probe fan-out and HTTP settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Maximum number of simultaneous in-flight probes.
    pub concurrency: usize,
    /// Per-candidate timeout in milliseconds.
    pub timeout_ms: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Largest response body accepted, in bytes.
    pub max_bytes: u64,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            timeout_ms: 8000,
            user_agent: concat!("artgrab/", env!("CARGO_PKG_VERSION")).to_string(),
            max_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Border-trim settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrimConfig {
    /// When false, archive members are the raw fetched bytes.
    pub enabled: bool,
    /// A pixel is blank when R, G and B are all at or below this value.
    pub threshold: u8,
    /// JPEG quality for trimmed output (1 = worst, 100 = best).
    pub quality: u8,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 30,
            quality: 95,
        }
    }
}

/// Output naming and fetch fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Leading component of member and archive filenames.
    pub prefix: String,
    /// Proxy URL templates (`{url}` is replaced by the candidate URL) tried
    /// in order after a direct fetch fails. Empty disables fallback.
    pub fallback_proxies: Vec<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            prefix: "artgrab".to_string(),
            fallback_proxies: Vec::new(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so a
///   `[[strategies]]` array replaces the catalog rather than extending it.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `artgrab.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `artgrab.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<PipelineConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `artgrab.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# artgrab Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# Command-line flags (--concurrency, --timeout-ms, --threshold, --no-trim)
# override the values in this file.

# ---------------------------------------------------------------------------
# Probing
# ---------------------------------------------------------------------------
[probe]
# Maximum number of simultaneous in-flight probes (1-64).
concurrency = 6

# Per-candidate upper bound in milliseconds. A probe that has not fetched
# and decoded its image by then counts as failed.
timeout_ms = 8000

# User-Agent header sent with every request.
user_agent = "artgrab/0.1.0"

# Largest response body accepted, in bytes.
max_bytes = 33554432

# ---------------------------------------------------------------------------
# Border trimming
# ---------------------------------------------------------------------------
[trim]
# Remove uniform dark borders (letterbox/pillarbox) before archiving.
# When disabled, archive members are the raw fetched bytes.
enabled = true

# A pixel is blank when its red, green and blue values are all at or
# below this threshold (0-255).
threshold = 30

# JPEG quality for trimmed output (1 = worst, 100 = best).
quality = 95

# ---------------------------------------------------------------------------
# Archive output
# ---------------------------------------------------------------------------
[archive]
# Leading component of every output filename.
prefix = "artgrab"

# Proxy URL templates tried, in order, after a direct fetch fails.
# "{url}" is replaced by the candidate URL. Empty disables fallback.
fallback_proxies = []

# ---------------------------------------------------------------------------
# Strategy catalog
# ---------------------------------------------------------------------------
# Uncomment to replace the built-in catalog. Each strategy expands to
# templates x variants candidates. Placeholders: {id} {variant} {width} {height}
#
# [[strategies]]
# name = "boxart"
# source = "titlecdn"
# type = "poster"
# templates = ["https://art.titlecdn.net/boxart/{id}/{variant}.jpg"]
# variants = [
#     { tag = "small", width = 166, height = 233 },
#     { tag = "large", width = 665, height = 935 },
# ]
"##
}
