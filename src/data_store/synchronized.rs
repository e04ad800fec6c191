use ahash::AHashMap as HashMap;
use log::trace;
use parking_lot::RwLock;

use crate::data_store::base_store::{apply_to_map, BaseStore, StoreMutation};

/// A base store guarded by a single reader-writer lock.
///
/// Every operation takes the one lock, which makes a committed batch
/// ([`BaseStore::apply`]) atomic with respect to other contexts at the cost
/// of serializing all writers.
#[derive(Debug, Default)]
pub struct SynchronizedStore {
    data: RwLock<HashMap<String, String>>,
}

impl SynchronizedStore {
    /// Creates a new, empty `SynchronizedStore`.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for SynchronizedStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let data = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            data: RwLock::new(data),
        }
    }
}

impl BaseStore for SynchronizedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    fn put(&self, key: String, value: String) -> Option<String> {
        self.data.write().insert(key, value)
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.data.write().remove(key)
    }

    fn clear(&self) {
        self.data.write().clear();
    }

    fn len(&self) -> usize {
        self.data.read().len()
    }

    fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    fn count_value(&self, value: &str) -> usize {
        self.data.read().values().filter(|v| *v == value).count()
    }

    fn snapshot(&self) -> HashMap<String, String> {
        self.data.read().clone()
    }

    fn apply(&self, mutations: Vec<StoreMutation>) {
        trace!("Applying batch of {} mutations under one lock", mutations.len());
        let mut data = self.data.write();
        for mutation in mutations {
            apply_to_map(&mut data, mutation);
        }
    }
}
