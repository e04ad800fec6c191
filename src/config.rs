use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::data_store::base_store::SharedStore;
use crate::data_store::striped::{ConcurrentStore, DEFAULT_SHARDS};
use crate::data_store::synchronized::SynchronizedStore;
use crate::errors::{Result, TkvsError};

/// Which base store implementation to build.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One lock around one map. Commits into the base store are atomic.
    Synchronized,
    /// Lock-striped map. Higher write concurrency, per-key atomicity only.
    #[default]
    Concurrent,
}

/// Store configuration, loadable from JSON.
///
/// ```json
/// { "backend": "concurrent", "shards": 32 }
/// ```
///
/// Missing fields take their defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TkvsConfig {
    pub backend: Backend,
    /// Shard count for [`Backend::Concurrent`]. Ignored otherwise.
    pub shards: usize,
}

impl Default for TkvsConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            shards: DEFAULT_SHARDS,
        }
    }
}

impl TkvsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend == Backend::Concurrent && self.shards == 0 {
            warn!("Rejected configuration with zero shards");
            return Err(TkvsError::Config(
                "shards must be at least 1 for the concurrent backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds an empty base store of the configured kind.
    pub fn build_store(&self) -> SharedStore {
        match self.backend {
            Backend::Synchronized => Arc::new(SynchronizedStore::new()),
            Backend::Concurrent => Arc::new(ConcurrentStore::with_shards(self.shards)),
        }
    }
}
