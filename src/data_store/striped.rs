use ahash::{AHashMap as HashMap, RandomState};
use parking_lot::RwLock;

use crate::data_store::base_store::BaseStore;

/// Number of shards used by [`ConcurrentStore::new`].
pub const DEFAULT_SHARDS: usize = 16;

/// A lock-striped base store.
///
/// Keys are spread over independent shards, so writers touching different
/// shards never contend. Per-key operations are atomic; `clear`, `len`,
/// `keys` and committed batches visit shards one after another and may
/// observe or interleave with concurrent writers.
pub struct ConcurrentStore {
    shards: Box<[RwLock<HashMap<String, String>>]>,
    hasher: RandomState,
}

impl ConcurrentStore {
    /// Creates an empty store with [`DEFAULT_SHARDS`] shards.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Creates an empty store with `shards` shards (at least one).
    pub fn with_shards(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &str) -> &RwLock<HashMap<String, String>> {
        let index = (self.hasher.hash_one(key) as usize) % self.shards.len();
        &self.shards[index]
    }
}

impl Default for ConcurrentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConcurrentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentStore")
            .field("shards", &self.shards.len())
            .field("len", &self.len())
            .finish()
    }
}

impl BaseStore for ConcurrentStore {
    fn get(&self, key: &str) -> Option<String> {
        self.shard(key).read().get(key).cloned()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.shard(key).read().contains_key(key)
    }

    fn put(&self, key: String, value: String) -> Option<String> {
        self.shard(&key).write().insert(key, value)
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.shard(key).write().remove(key)
    }

    fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().clear();
        }
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for shard in self.shards.iter() {
            keys.extend(shard.read().keys().cloned());
        }
        keys
    }

    fn count_value(&self, value: &str) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().values().filter(|v| *v == value).count())
            .sum()
    }

    fn snapshot(&self) -> HashMap<String, String> {
        let mut snapshot = HashMap::new();
        for shard in self.shards.iter() {
            snapshot.extend(
                shard
                    .read()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            );
        }
        snapshot
    }
}
