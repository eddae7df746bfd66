// Chunk: docs/chunks/document_config - Document tuning loaded from JSON

//! Document configuration.
//!
//! Tuning knobs for a [`Document`](crate::Document): gap sizing of the
//! character store, an optional cap on the number of undo steps and the
//! number of side-channel fields per line. Every field has a default, so a
//! config file only needs the keys it wants to change:
//!
//! ```json
//! { "undo_limit": 1000, "fields_per_line": 2 }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::gap_buffer::{INITIAL_GAP_SIZE, INITIAL_GROWTH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Gap size of a freshly created character store.
    pub initial_gap: usize,
    /// Starting growth increment of the gap; doubled while small.
    pub gap_growth: usize,
    /// Maximum number of undo steps kept, unlimited when absent.
    pub undo_limit: Option<usize>,
    /// Number of side-channel fields attached to every line.
    pub fields_per_line: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            initial_gap: INITIAL_GAP_SIZE,
            gap_growth: INITIAL_GROWTH,
            undo_limit: None,
            fields_per_line: 1,
        }
    }
}

impl DocumentConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid document config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading document config {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("loading {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing document config")
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.gap_growth > 0, "gap_growth must be positive");
        if let Some(limit) = self.undo_limit {
            ensure!(limit > 0, "undo_limit must be positive when set");
        }
        Ok(())
    }
}
