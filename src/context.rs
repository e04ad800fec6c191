use ahash::AHashMap as HashMap;
use log::debug;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use crate::data_store::base_store::SharedStore;
use crate::transaction::Transaction;

/// Holds the current transaction frame of one execution context.
///
/// Beginning a transaction pushes a new frame over the current one; closing
/// pops back to its parent. A fresh context starts at root, where every
/// operation reaches the shared base store directly.
#[derive(Debug)]
pub struct TransactionContext {
    current: Transaction,
}

impl TransactionContext {
    pub fn new(store: SharedStore) -> Self {
        Self {
            current: Transaction::root(store),
        }
    }

    /// The active frame.
    pub fn current(&self) -> &Transaction {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Transaction {
        &mut self.current
    }

    /// Number of open transactions in this context.
    pub fn depth(&self) -> usize {
        self.current.depth()
    }

    /// Opens a nested transaction.
    pub fn begin(&mut self) {
        self.replace_current(Transaction::begin);
        debug!("Transaction begun, depth {}", self.depth());
    }

    /// Closes the innermost transaction, merging it into its parent when
    /// `merge` is set.
    ///
    /// Returns false if no transaction was open.
    pub fn close(&mut self, merge: bool) -> bool {
        if self.current.is_root() {
            return false;
        }
        self.replace_current(|current| current.close(merge));
        debug!(
            "Transaction {}, depth {}",
            if merge { "committed" } else { "rolled back" },
            self.depth()
        );
        true
    }

    pub fn commit(&mut self) -> bool {
        self.close(true)
    }

    pub fn rollback(&mut self) -> bool {
        self.close(false)
    }

    fn replace_current(&mut self, step: impl FnOnce(Transaction) -> Transaction) {
        let placeholder = Transaction::root(Arc::clone(self.current.store()));
        let current = std::mem::replace(&mut self.current, placeholder);
        self.current = step(current);
    }
}

type ContextMap = Mutex<HashMap<ThreadId, Arc<Mutex<TransactionContext>>>>;

thread_local! {
    static REGISTRATIONS: Registrations = Registrations::new();
}

/// The registries the current thread owns a context in. Dropped when the
/// thread exits, which releases those contexts.
struct Registrations {
    thread: ThreadId,
    registries: RefCell<Vec<Weak<ContextMap>>>,
}

impl Registrations {
    fn new() -> Self {
        Self {
            thread: thread::current().id(),
            registries: RefCell::new(Vec::new()),
        }
    }

    fn register(&self, contexts: &Arc<ContextMap>) {
        let mut registries = self.registries.borrow_mut();
        registries.retain(|registry| registry.strong_count() > 0);
        if !registries
            .iter()
            .any(|registry| std::ptr::eq(registry.as_ptr(), Arc::as_ptr(contexts)))
        {
            registries.push(Arc::downgrade(contexts));
        }
    }
}

impl Drop for Registrations {
    fn drop(&mut self) {
        for registry in self.registries.get_mut().drain(..) {
            // No logging here: other thread-locals may already be gone.
            if let Some(contexts) = registry.upgrade() {
                let _released = contexts.lock().remove(&self.thread);
            }
        }
    }
}

/// Per-thread transaction contexts over one shared base store.
///
/// Each calling thread lazily gets its own [`TransactionContext`], starting
/// at root. A context is only ever touched by the thread that owns it, so
/// its lock is uncontended; the registry lock is held just long enough to
/// find or create the entry. A thread's context, including any transactions
/// it left open, is discarded when the thread exits.
pub struct ThreadContexts {
    store: SharedStore,
    contexts: Arc<ContextMap>,
}

impl ThreadContexts {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            contexts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Runs `f` against the calling thread's context, creating it at root on
    /// first use.
    ///
    /// `f` must not call back into this registry.
    pub fn with_current<R>(&self, f: impl FnOnce(&mut TransactionContext) -> R) -> R {
        let (context, created) = {
            let mut contexts = self.contexts.lock();
            let mut created = false;
            let context = contexts.entry(thread::current().id()).or_insert_with(|| {
                created = true;
                Arc::new(Mutex::new(TransactionContext::new(Arc::clone(&self.store))))
            });
            (Arc::clone(context), created)
        };
        if created {
            // Fails only while the thread is already tearing down.
            let _ = REGISTRATIONS.try_with(|registrations| registrations.register(&self.contexts));
        }
        let mut guard = context.lock();
        f(&mut guard)
    }

    /// Drops the calling thread's context, discarding any open transactions.
    ///
    /// Returns true if the thread had a context.
    pub fn detach_current(&self) -> bool {
        let removed = self.contexts.lock().remove(&thread::current().id());
        if let Some(context) = &removed {
            let depth = context.lock().depth();
            if depth > 0 {
                debug!("Detached thread context with {} open transactions", depth);
            }
        }
        removed.is_some()
    }

    /// Number of threads that currently own a context.
    pub fn len(&self) -> usize {
        self.contexts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ThreadContexts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadContexts")
            .field("contexts", &self.len())
            .finish()
    }
}
