//! Common utilities for tkvs integration tests.

use rand::Rng;
use rand::distr::Alphanumeric;
use std::cell::RefCell;
use std::sync::Arc;

use tkvs::{Backend, ConcurrentStore, SharedStore, StorageApi, SynchronizedStore, Tkvs, TkvsConfig};

/// Both backends, so behavioural tests can run against each.
pub const BACKENDS: [Backend; 2] = [Backend::Synchronized, Backend::Concurrent];

/// Helper function to create a Tkvs instance over an empty store of the given kind.
pub fn setup_tkvs(backend: Backend) -> Tkvs {
    let config = TkvsConfig {
        backend,
        ..TkvsConfig::default()
    };
    Tkvs::from_config(&config).unwrap()
}

/// Helper function to create a base store pre-filled with `pairs`.
pub fn seeded_store(backend: Backend, pairs: &[(&str, &str)]) -> SharedStore {
    let iter = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string()));
    match backend {
        Backend::Synchronized => Arc::new(SynchronizedStore::from_iter(iter)),
        Backend::Concurrent => {
            let store = ConcurrentStore::new();
            for (key, value) in iter {
                tkvs::BaseStore::put(&store, key, value);
            }
            Arc::new(store)
        }
    }
}

/// Random alphanumeric string of 4 to 7 characters.
pub fn rnd() -> String {
    let mut rng = rand::rng();
    let len = rng.random_range(4..8);
    rng.sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

// --- MockStorageApi ---

/// One call observed by [`MockStorageApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Begin,
    Rollback,
    Commit,
    Set(String, String),
    Get(String),
    Delete(String),
    Count(Option<String>),
}

/// A `StorageApi` that records every call and answers with canned results.
#[derive(Debug, Default)]
pub struct MockStorageApi {
    pub calls: RefCell<Vec<Call>>,
    /// Returned by `get`.
    pub value: Option<String>,
    /// Returned by `count`.
    pub count: usize,
    /// Returned by `commit` and `rollback`.
    pub closes: bool,
}

impl MockStorageApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl StorageApi for MockStorageApi {
    fn begin(&mut self) {
        self.calls.borrow_mut().push(Call::Begin);
    }

    fn rollback(&mut self) -> bool {
        self.calls.borrow_mut().push(Call::Rollback);
        self.closes
    }

    fn commit(&mut self) -> bool {
        self.calls.borrow_mut().push(Call::Commit);
        self.closes
    }

    fn set(&mut self, key: &str, value: &str) {
        self.calls
            .borrow_mut()
            .push(Call::Set(key.to_string(), value.to_string()));
    }

    fn get(&self, key: &str) -> Option<String> {
        self.calls.borrow_mut().push(Call::Get(key.to_string()));
        self.value.clone()
    }

    fn delete(&mut self, key: &str) {
        self.calls.borrow_mut().push(Call::Delete(key.to_string()));
    }

    fn count(&self, value: Option<&str>) -> usize {
        self.calls
            .borrow_mut()
            .push(Call::Count(value.map(str::to_string)));
        self.count
    }
}
