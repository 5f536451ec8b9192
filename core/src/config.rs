use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do with a follower when every candidate leader's cluster is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Leave the follower out of every cluster and record it as unassigned.
    #[default]
    Drop,
    /// Place the follower with its most similar leader, ignoring the cap.
    ForceBest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Terms longer than this many characters are dropped.
    pub max_term_len: usize,
    /// Apply the English Snowball stemmer to every term.
    pub stem: bool,
    /// Remove common English stopwords.
    pub stopwords: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { max_term_len: 20, stem: false, stopwords: false }
    }
}

/// Weights for the title/body zone index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub title_weight: f64,
    pub body_weight: f64,
    pub result_size: usize,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self { title_weight: 0.8, body_weight: 0.2, result_size: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of results returned by a clustered query.
    pub result_size: usize,
    /// Seed for leader selection. `None` draws from the thread RNG.
    pub seed: Option<u64>,
    pub overflow: OverflowPolicy,
    pub analyzer: AnalyzerConfig,
    pub zones: ZoneConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            result_size: 3,
            seed: None,
            overflow: OverflowPolicy::default(),
            analyzer: AnalyzerConfig::default(),
            zones: ZoneConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.result_size == 0 {
            return Err(Error::InvalidConfig("result_size must be at least 1".into()));
        }
        if self.analyzer.max_term_len == 0 {
            return Err(Error::InvalidConfig("analyzer.max_term_len must be at least 1".into()));
        }
        if self.zones.result_size == 0 {
            return Err(Error::InvalidConfig("zones.result_size must be at least 1".into()));
        }
        let weights = [self.zones.title_weight, self.zones.body_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidConfig("zone weights must be finite and non-negative".into()));
        }
        Ok(())
    }
}
