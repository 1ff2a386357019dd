// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading and validation for the rethrow benchmark.
//!
//! This crate provides [`BenchConfig`], the optional settings read from
//! `rethrow-bench.toml`, together with helpers for parsing it and producing
//! advisory [`ConfigWarning`]s.  The iteration count is not configurable
//! here; it only comes from the command line.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file could not be read.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A scenario is listed more than once and will run more than once.
    DuplicateScenario {
        /// Scenario name.
        name: String,
    },
    /// The log level emits per-operation events inside the timed region.
    VerboseLogging {
        /// Configured level.
        level: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::DuplicateScenario { name } => {
                write!(f, "scenario '{name}' is listed more than once")
            }
            ConfigWarning::VerboseLogging { level } => {
                write!(f, "log level '{level}' adds logging cost to timed operations")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// How reports are printed.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One human-readable line per scenario.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Settings for the benchmark binary.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BenchConfig {
    /// Log level (e.g. `"warn"`, `"info"`, `"debug"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Scenarios to run, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<String>>,

    /// Report format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,
}

impl BenchConfig {
    /// Effective log level.
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Effective scenario list.
    pub fn scenarios(&self) -> Vec<String> {
        match &self.scenarios {
            Some(list) => list.clone(),
            None => KNOWN_SCENARIOS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Effective report format.
    pub fn format(&self) -> ReportFormat {
        self.format.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "rethrow-bench.toml";

/// Scenarios the benchmark binary knows how to run.
pub const KNOWN_SCENARIOS: &[&str] = &["rethrow", "switch"];

/// Log level used when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`BenchConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`BenchConfig::default()`].
pub fn load_config(path: Option<&Path>) -> Result<BenchConfig, ConfigError> {
    match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)
        }
        None => Ok(BenchConfig::default()),
    }
}

/// Path of the config file in `dir`, if one exists.
pub fn discover_config(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Parse a TOML string into a [`BenchConfig`].
pub fn parse_toml(content: &str) -> Result<BenchConfig, ConfigError> {
    toml::from_str::<BenchConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Unknown log levels, unknown scenarios, and an empty scenario list are
/// hard errors; the rest come back as warnings.
pub fn validate_config(config: &BenchConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level {
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!("invalid log_level '{level}'"));
        } else if level == "debug" || level == "trace" {
            warnings.push(ConfigWarning::VerboseLogging {
                level: level.clone(),
            });
        }
    }

    if let Some(ref scenarios) = config.scenarios {
        if scenarios.is_empty() {
            errors.push("scenarios must not be empty".into());
        }
        let mut seen: Vec<&str> = Vec::new();
        for name in scenarios {
            if !KNOWN_SCENARIOS.contains(&name.as_str()) {
                errors.push(format!(
                    "unknown scenario '{name}' (expected one of {KNOWN_SCENARIOS:?})"
                ));
            } else if seen.contains(&name.as_str()) {
                if !warnings
                    .iter()
                    .any(|w| matches!(w, ConfigWarning::DuplicateScenario { name: n } if n == name))
                {
                    warnings.push(ConfigWarning::DuplicateScenario { name: name.clone() });
                }
            } else {
                seen.push(name);
            }
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
