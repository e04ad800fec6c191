use std::sync::Arc;

use crate::context::{ThreadContexts, TransactionContext};
use crate::data_store::base_store::SharedStore;

/// Programmatic interface to the store, scoped to one execution context.
///
/// Every call acts on the context's innermost open transaction, or directly
/// on the base store when none is open.
pub trait StorageApi {
    /// Opens a nested transaction.
    fn begin(&mut self);

    /// Discards the innermost transaction. Returns false if none was open.
    fn rollback(&mut self) -> bool;

    /// Merges the innermost transaction into its parent. Returns false if
    /// none was open.
    fn commit(&mut self) -> bool;

    fn set(&mut self, key: &str, value: &str);

    fn get(&self, key: &str) -> Option<String>;

    fn delete(&mut self, key: &str);

    /// Total number of entries when `value` is `None`, otherwise the number
    /// of entries whose value equals it.
    fn count(&self, value: Option<&str>) -> usize;
}

fn count_in(context: &TransactionContext, value: Option<&str>) -> usize {
    match value {
        Some(value) => context.current().count(value),
        None => context.current().len(),
    }
}

/// A caller-owned execution context.
///
/// Independent sessions over the same base store never see each other's
/// uncommitted writes.
#[derive(Debug)]
pub struct Session {
    context: TransactionContext,
}

impl Session {
    pub fn new(store: SharedStore) -> Self {
        Self {
            context: TransactionContext::new(store),
        }
    }

    /// Clears the resolved view of the innermost transaction (or the base
    /// store at root).
    pub fn clear(&mut self) {
        self.context.current_mut().clear();
    }

    /// Number of open transactions.
    pub fn depth(&self) -> usize {
        self.context.depth()
    }

    pub fn context(&self) -> &TransactionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut TransactionContext {
        &mut self.context
    }
}

impl StorageApi for Session {
    fn begin(&mut self) {
        self.context.begin();
    }

    fn rollback(&mut self) -> bool {
        self.context.rollback()
    }

    fn commit(&mut self) -> bool {
        self.context.commit()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.context
            .current_mut()
            .put(key.to_owned(), value.to_owned());
    }

    fn get(&self, key: &str) -> Option<String> {
        self.context.current().get(key)
    }

    fn delete(&mut self, key: &str) {
        self.context.current_mut().remove(key);
    }

    fn count(&self, value: Option<&str>) -> usize {
        count_in(&self.context, value)
    }
}

/// A shareable handle whose execution context is the calling thread.
///
/// Clones share one registry, so a thread sees the same open transactions
/// through any clone, while different threads stay isolated until commit.
#[derive(Debug, Clone)]
pub struct ThreadBoundStorage {
    contexts: Arc<ThreadContexts>,
}

impl ThreadBoundStorage {
    pub fn new(store: SharedStore) -> Self {
        Self::from_contexts(Arc::new(ThreadContexts::new(store)))
    }

    pub fn from_contexts(contexts: Arc<ThreadContexts>) -> Self {
        Self { contexts }
    }

    pub fn contexts(&self) -> &Arc<ThreadContexts> {
        &self.contexts
    }

    /// Clears the resolved view of the calling thread's innermost transaction.
    pub fn clear(&self) {
        self.contexts.with_current(|context| context.current_mut().clear());
    }

    /// Number of transactions open on the calling thread.
    pub fn depth(&self) -> usize {
        self.contexts.with_current(|context| context.depth())
    }
}

impl StorageApi for ThreadBoundStorage {
    fn begin(&mut self) {
        self.contexts.with_current(TransactionContext::begin);
    }

    fn rollback(&mut self) -> bool {
        self.contexts.with_current(TransactionContext::rollback)
    }

    fn commit(&mut self) -> bool {
        self.contexts.with_current(TransactionContext::commit)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.contexts.with_current(|context| {
            context
                .current_mut()
                .put(key.to_owned(), value.to_owned());
        });
    }

    fn get(&self, key: &str) -> Option<String> {
        self.contexts
            .with_current(|context| context.current().get(key))
    }

    fn delete(&mut self, key: &str) {
        self.contexts.with_current(|context| {
            context.current_mut().remove(key);
        });
    }

    fn count(&self, value: Option<&str>) -> usize {
        self.contexts
            .with_current(|context| count_in(context, value))
    }
}

impl<T: StorageApi + ?Sized> StorageApi for &mut T {
    fn begin(&mut self) {
        (**self).begin();
    }

    fn rollback(&mut self) -> bool {
        (**self).rollback()
    }

    fn commit(&mut self) -> bool {
        (**self).commit()
    }

    fn set(&mut self, key: &str, value: &str) {
        (**self).set(key, value);
    }

    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn delete(&mut self, key: &str) {
        (**self).delete(key);
    }

    fn count(&self, value: Option<&str>) -> usize {
        (**self).count(value)
    }
}
