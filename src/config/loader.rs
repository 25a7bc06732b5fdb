// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::consts::{DEFAULT_MAX_CONCURRENCY, MAX_CONCURRENCY_LIMIT, MAX_TIMEOUT_SECONDS};
use crate::errors::{ConfigError, FailurePolicy};
use crate::registry::MissingSchemaPolicy;

/// Engine-wide settings.
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// # Example
/// ```yaml
/// failure_policy: continue        # continue | abort
/// schema:
///   missing_schema: permissive    # permissive | reject
///   violation_fatal: false
/// executor_options:
///   max_concurrency: 4
///   timeout_seconds: 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub schema: SchemaOptions,
    #[serde(default)]
    pub executor_options: ExecutorOptions,
}

/// How IR validation treats missing schemas and schema violations.
///
/// # Fields
/// * `missing_schema` - What to do when a step version has no active schema
/// * `violation_fatal` - Whether invalid IR fails the step run
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaOptions {
    #[serde(default)]
    pub missing_schema: MissingSchemaPolicy,
    #[serde(default)]
    pub violation_fatal: bool,
}

/// Scheduling limits for step execution.
///
/// # Fields
/// * `max_concurrency` - Nodes of one level running at once (defaults to 4)
/// * `timeout_seconds` - Per-step timeout; unset means no timeout
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorOptions {
    pub max_concurrency: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

impl ExecutorOptions {
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl EngineConfig {
    /// Rejects values that would stall or starve the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let options = &self.executor_options;
        if let Some(n) = options.max_concurrency {
            if n == 0 || n > MAX_CONCURRENCY_LIMIT {
                return Err(ConfigError::Invalid {
                    reason: format!(
                        "executor_options.max_concurrency must be between 1 and {MAX_CONCURRENCY_LIMIT}, got {n}"
                    ),
                });
            }
        }
        if let Some(secs) = options.timeout_seconds {
            if secs == 0 || secs > MAX_TIMEOUT_SECONDS {
                return Err(ConfigError::Invalid {
                    reason: format!(
                        "executor_options.timeout_seconds must be between 1 and {MAX_TIMEOUT_SECONDS}, got {secs}"
                    ),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
                extension,
            }),
        }
    }
}

/// Reads, parses and validates an engine configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&contents, format, &path.display().to_string())
}

/// Parses and validates configuration text. `origin` names the source in errors.
pub fn parse_config(contents: &str, format: ConfigFormat, origin: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = match format {
        // An empty YAML document is `null`, which serde cannot read as a struct.
        ConfigFormat::Yaml if contents.trim().is_empty() => EngineConfig::default(),
        ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|source| ConfigError::Yaml {
            path: origin.to_string(),
            source,
        })?,
        ConfigFormat::Toml => toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: origin.to_string(),
            source,
        })?,
    };
    config.validate()?;
    Ok(config)
}
