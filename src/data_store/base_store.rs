use ahash::AHashMap as HashMap;
use std::sync::Arc;

/// A shared handle to the base store, cloned into every execution context.
pub type SharedStore = Arc<dyn BaseStore>;

/// A single change handed to [`BaseStore::apply`] when a transaction commits
/// into the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreMutation {
    /// Remove every entry.
    Clear,
    /// Insert or overwrite `key` with the given value.
    Put(String, String),
    /// Remove `key`. A no-op if the key is absent.
    Remove(String),
}

/// The shared, process-lifetime map from string keys to string values.
///
/// This is the only state visible across execution contexts, so every
/// implementation must be safe for concurrent readers and writers. Writes
/// that reach the base store are immediately visible to all contexts.
///
/// Per-key operations are atomic. Multi-key atomicity is only guaranteed by
/// [`BaseStore::apply`] for implementations that override it.
pub trait BaseStore: Send + Sync {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Returns true if `key` is present.
    fn contains_key(&self, key: &str) -> bool;

    /// Stores `value` under `key`, returning the previous value.
    fn put(&self, key: String, value: String) -> Option<String>;

    /// Removes `key`, returning the previous value.
    fn remove(&self, key: &str) -> Option<String>;

    /// Removes every entry.
    fn clear(&self);

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys currently present.
    fn keys(&self) -> Vec<String>;

    /// Number of entries whose value equals `value`.
    fn count_value(&self, value: &str) -> usize;

    /// A point-in-time copy of the contents.
    fn snapshot(&self) -> HashMap<String, String>;

    /// Applies a batch of mutations in order.
    ///
    /// The default implementation applies each mutation on its own, so
    /// concurrent batches from different contexts may interleave.
    fn apply(&self, mutations: Vec<StoreMutation>) {
        for mutation in mutations {
            match mutation {
                StoreMutation::Clear => self.clear(),
                StoreMutation::Put(key, value) => {
                    self.put(key, value);
                }
                StoreMutation::Remove(key) => {
                    self.remove(&key);
                }
            }
        }
    }
}

/// Applies one mutation to a plain map. Shared by the lock-based backends.
pub(crate) fn apply_to_map(data: &mut HashMap<String, String>, mutation: StoreMutation) {
    match mutation {
        StoreMutation::Clear => data.clear(),
        StoreMutation::Put(key, value) => {
            data.insert(key, value);
        }
        StoreMutation::Remove(key) => {
            data.remove(&key);
        }
    }
}
