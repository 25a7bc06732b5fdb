// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::{ErrorCode, RegistryError};

/// Errors raised while loading engine configuration or seed files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in '{path}': {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse TOML in '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported config format '{extension}' for '{path}' (expected yaml, yml or toml)")]
    UnsupportedFormat { path: String, extension: String },

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },

    #[error("seed could not be applied: {0}")]
    Registry(#[from] RegistryError),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Registry(e) => e.code(),
            _ => ErrorCode::InvalidConfig,
        }
    }
}
