use serde::{Deserialize, Serialize};

use crate::params::{MAX_RESULTS, MIN_RESULTS};

/// Top-level configuration for an insider query session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InsiderConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Retention policy for the result cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// How many fetched datasets to keep. `0` disables caching;
    /// `None` keeps every fetch for the life of the session.
    #[serde(default = "default_capacity")]
    pub capacity: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Configuration for the query agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Result cap a fetch must have been made at before it is reused for
    /// other requests. A reused fetch must also reach the new request's cap.
    #[serde(default = "default_max_rows")]
    pub max_rows: u32,
    /// Cap used when a request does not set `num_results`.
    #[serde(default = "default_num_results")]
    pub default_num_results: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            default_num_results: default_num_results(),
        }
    }
}

impl AgentConfig {
    /// `max_rows` clamped into the range the screener accepts.
    pub fn effective_max_rows(&self) -> u32 {
        self.max_rows.clamp(MIN_RESULTS, MAX_RESULTS)
    }
}

fn default_capacity() -> Option<usize> {
    Some(2)
}
fn default_max_rows() -> u32 {
    MAX_RESULTS
}
fn default_num_results() -> u32 {
    1000
}
