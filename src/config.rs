use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::experiment::DEFAULT_THRESHOLD;

/// Per-run settings for converting and exporting one experiment.
///
/// Every field is optional in JSON:
///
/// ```json
/// {
///   "threshold": 120.0,
///   "one_based": false,
///   "contacts_template": "contacts_{experiment_id}.tsv",
///   "distances_template": "distances_{experiment_id}.tsv"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Contact threshold in the matrix's distance unit.
    pub threshold: f64,
    /// Whether the coordinate table is labelled from 1.
    pub one_based: bool,
    /// Output filename template for contacts; `None` skips writing them.
    pub contacts_template: Option<String>,
    /// Output filename template for distances; `None` skips writing them.
    pub distances_template: Option<String>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            one_based: true,
            contacts_template: None,
            distances_template: None,
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing experiment config")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&text)
    }
}
