// SPDX-License-Identifier: MIT OR Apache-2.0
//! Driver configuration loaded from an optional RON file.

use nodeflow_graph::BinaryOp;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for [`AppConfig`]
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Settings for a headless run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Literal of the first source
    pub source_a: f32,
    /// Literal of the second source
    pub source_b: f32,
    /// Operation of the combiner
    pub operation: BinaryOp,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "info,nodeflow_graph=debug".to_string(),
            source_a: 2.0,
            source_b: 3.0,
            operation: BinaryOp::Add,
        }
    }
}

impl AppConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Parse a config from RON text; missing fields take their defaults
    pub fn from_ron(contents: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(contents)?)
    }
}
