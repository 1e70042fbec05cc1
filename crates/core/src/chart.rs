//! Strategy charts: immutable, sourced threshold tables.
//!
//! A chart couples its numeric rules with the metadata of the published
//! table they were taken from, so every decision stays auditable. Charts
//! are validated once at load time; evaluation never fails.

use std::{fs, path::Path};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure while loading a chart. Always fatal at load time; a running
/// session never sees a malformed chart.
#[derive(Debug, Error)]
pub enum ChartError {
    /// The chart file could not be read.
    #[error("failed to read chart {path}")]
    Read {
        /// Path of the chart file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The chart file is not a valid chart document.
    #[error("failed to parse chart {path}")]
    Parse {
        /// Path of the chart file.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Comparison direction for a threshold rule. Unrecognised kinds fail
/// deserialisation, which is the chart-load path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// Decision applies when the true count is at or above the threshold.
    Gte,
    /// Decision applies when the true count is at or below the threshold.
    Lte,
}

/// A single chart-sourced threshold rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRule {
    /// True-count threshold.
    pub tc_threshold: i32,
    /// Direction the threshold applies in.
    pub comparison: Comparison,
}

impl StrategyRule {
    /// Evaluate the rule against a true count.
    pub fn evaluate(&self, true_count: i32) -> bool {
        match self.comparison {
            Comparison::Gte => true_count >= self.tc_threshold,
            Comparison::Lte => true_count <= self.tc_threshold,
        }
    }
}

/// Provenance of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartMetadata {
    /// Stable chart identifier.
    pub id: String,
    /// URL of the published table the rules were taken from.
    pub source_url: String,
}

/// Named, versioned, immutable rule table. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    /// Where these rules come from.
    pub metadata: ChartMetadata,
    /// Take-insurance rule.
    pub insurance: StrategyRule,
}

impl Chart {
    /// Parse and validate a chart from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Load and validate a chart file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChartError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ChartError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ChartError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Built-in Hi-Lo chart. Insurance becomes profitable at a true count of
/// three or better.
pub static DEFAULT_CHART: Lazy<Chart> = Lazy::new(|| Chart {
    metadata: ChartMetadata {
        id: "hi-lo-insurance".to_string(),
        source_url: "https://wizardofodds.com/games/blackjack/card-counting/high-low/"
            .to_string(),
    },
    insurance: StrategyRule {
        tc_threshold: 3,
        comparison: Comparison::Gte,
    },
});
