use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use log::trace;
use std::mem;
use std::sync::Arc;

use crate::data_store::base_store::{SharedStore, StoreMutation};

/// The active frame of one execution context's transaction stack.
///
/// There is no explicit stack container: a [`Transaction::Nested`] frame owns
/// its parent frame, so the parent chain *is* the stack. Opening a transaction
/// wraps the current frame, closing one unwraps it again. At the bottom of
/// every chain sits [`Transaction::Root`], which passes all operations
/// straight through to the shared base store.
pub enum Transaction {
    /// No open transaction. Reads and writes go directly to the base store.
    Root(SharedStore),
    /// One level of buffered, uncommitted changes over a parent frame.
    Nested(Box<TransactionNode>),
}

/// One level of transactional isolation.
///
/// Mutations are buffered locally until the level is merged into its parent
/// (commit) or dropped (rollback). Reads consult, in order: `deleted`,
/// `changed`, `inserted`, `cleared`, and finally the parent.
pub struct TransactionNode {
    parent: Transaction,
    /// Base store at the bottom of the chain.
    store: SharedStore,
    /// Number of nested levels up to and including this one.
    depth: usize,
    /// Keys that existed in the parent view and were overwritten here.
    changed: HashMap<String, String>,
    /// Keys that did not exist in the parent view and were set here.
    inserted: HashMap<String, String>,
    /// Parent keys removed at this level.
    deleted: HashSet<String>,
    /// Set once `clear` ran at this level; hides the whole parent view.
    cleared: bool,
    /// Set on the first mutation. Commit of a clean level is a no-op.
    dirty: bool,
}

/// Outcome of looking a key up in a single level.
enum Lookup<'a> {
    Found(&'a str),
    Absent,
    Inherit,
}

impl Transaction {
    /// Creates a root frame over `store`.
    pub fn root(store: SharedStore) -> Self {
        Transaction::Root(store)
    }

    /// Returns true if no transaction is open.
    pub fn is_root(&self) -> bool {
        matches!(self, Transaction::Root(_))
    }

    /// Number of open nested levels. Zero at root.
    pub fn depth(&self) -> usize {
        match self {
            Transaction::Root(_) => 0,
            Transaction::Nested(node) => node.depth,
        }
    }

    /// The base store at the bottom of this chain.
    pub fn store(&self) -> &SharedStore {
        match self {
            Transaction::Root(store) => store,
            Transaction::Nested(node) => &node.store,
        }
    }

    /// Returns the value of `key` in the resolved view of this frame.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut frame = self;
        loop {
            match frame {
                Transaction::Root(store) => return store.get(key),
                Transaction::Nested(node) => match node.lookup(key) {
                    Lookup::Found(value) => return Some(value.to_owned()),
                    Lookup::Absent => return None,
                    Lookup::Inherit => frame = &node.parent,
                },
            }
        }
    }

    /// Returns true if `key` is present in the resolved view of this frame.
    pub fn contains_key(&self, key: &str) -> bool {
        let mut frame = self;
        loop {
            match frame {
                Transaction::Root(store) => return store.contains_key(key),
                Transaction::Nested(node) => match node.lookup(key) {
                    Lookup::Found(_) => return true,
                    Lookup::Absent => return false,
                    Lookup::Inherit => frame = &node.parent,
                },
            }
        }
    }

    /// Sets `key` to `value`, returning the previously resolved value.
    ///
    /// At root the write reaches the base store immediately.
    pub fn put(&mut self, key: String, value: String) -> Option<String> {
        match self {
            Transaction::Root(store) => store.put(key, value),
            Transaction::Nested(node) => node.put(key, value),
        }
    }

    /// Removes `key`, returning the previously resolved value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        match self {
            Transaction::Root(store) => store.remove(key),
            Transaction::Nested(node) => node.remove(key),
        }
    }

    /// Removes every key from the resolved view.
    pub fn clear(&mut self) {
        match self {
            Transaction::Root(store) => store.clear(),
            Transaction::Nested(node) => node.clear(),
        }
    }

    /// Number of keys in the resolved view.
    pub fn len(&self) -> usize {
        let mut levels = Vec::new();
        let mut frame = self;
        let mut size = loop {
            match frame {
                Transaction::Root(store) => break store.len(),
                Transaction::Nested(node) => {
                    levels.push(node);
                    frame = &node.parent;
                }
            }
        };
        for node in levels.iter().rev() {
            size = node.size_over(size);
        }
        size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The effective key set of this frame.
    pub fn keys(&self) -> HashSet<String> {
        let mut levels = Vec::new();
        let mut frame = self;
        let mut keys: HashSet<String> = loop {
            match frame {
                Transaction::Root(store) => break store.keys().into_iter().collect(),
                Transaction::Nested(node) => {
                    levels.push(node);
                    frame = &node.parent;
                }
            }
        };
        for node in levels.iter().rev() {
            if node.cleared {
                keys.clear();
            }
            for key in &node.deleted {
                keys.remove(key);
            }
            keys.extend(node.changed.keys().cloned());
            keys.extend(node.inserted.keys().cloned());
        }
        keys
    }

    /// Number of keys whose resolved value equals `value`.
    ///
    /// Inside a transaction every key of the effective key set is resolved,
    /// so this is linear in the number of keys.
    pub fn count(&self, value: &str) -> usize {
        match self {
            Transaction::Root(store) => store.count_value(value),
            Transaction::Nested(_) => self
                .keys()
                .iter()
                .filter(|key| self.get(key).as_deref() == Some(value))
                .count(),
        }
    }

    /// Opens a nested transaction over this frame.
    pub fn begin(self) -> Transaction {
        Transaction::Nested(Box::new(TransactionNode::new(self)))
    }

    /// Closes the innermost transaction and returns its parent frame.
    ///
    /// With `merge` set, buffered changes of a dirty level are applied to
    /// the parent first. Without it they are discarded. Closing a root frame
    /// returns it unchanged.
    pub fn close(self, merge: bool) -> Transaction {
        match self {
            Transaction::Root(store) => Transaction::Root(store),
            Transaction::Nested(node) => (*node).close(merge),
        }
    }

    /// Applies a child level's buffered changes to this frame.
    fn merge(
        &mut self,
        cleared: bool,
        changed: HashMap<String, String>,
        inserted: HashMap<String, String>,
        deleted: HashSet<String>,
    ) {
        match self {
            Transaction::Root(store) => {
                let mut mutations =
                    Vec::with_capacity(changed.len() + inserted.len() + deleted.len() + 1);
                if cleared {
                    mutations.push(StoreMutation::Clear);
                }
                mutations.extend(
                    changed
                        .into_iter()
                        .chain(inserted)
                        .map(|(key, value)| StoreMutation::Put(key, value)),
                );
                mutations.extend(deleted.into_iter().map(StoreMutation::Remove));
                trace!("Merging {} mutations into base store", mutations.len());
                store.apply(mutations);
            }
            Transaction::Nested(node) => {
                if cleared {
                    node.clear();
                }
                for (key, value) in changed.into_iter().chain(inserted) {
                    node.put(key, value);
                }
                for key in deleted {
                    node.remove(&key);
                }
            }
        }
    }
}

impl TransactionNode {
    fn new(parent: Transaction) -> Self {
        Self {
            store: Arc::clone(parent.store()),
            depth: parent.depth() + 1,
            parent,
            changed: HashMap::new(),
            inserted: HashMap::new(),
            deleted: HashSet::new(),
            cleared: false,
            dirty: false,
        }
    }

    fn lookup(&self, key: &str) -> Lookup<'_> {
        if self.deleted.contains(key) {
            Lookup::Absent
        } else if let Some(value) = self.changed.get(key) {
            Lookup::Found(value)
        } else if let Some(value) = self.inserted.get(key) {
            Lookup::Found(value)
        } else if self.cleared {
            Lookup::Absent
        } else {
            Lookup::Inherit
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.lookup(key) {
            Lookup::Found(value) => Some(value.to_owned()),
            Lookup::Absent => None,
            Lookup::Inherit => self.parent.get(key),
        }
    }

    fn put(&mut self, key: String, value: String) -> Option<String> {
        let previous = self.get(&key);
        self.dirty = true;
        self.deleted.remove(&key);
        // A cleared level hides its parent, so the key is new from here.
        if !self.cleared && self.parent.contains_key(&key) {
            self.inserted.remove(&key);
            self.changed.insert(key, value);
        } else {
            self.changed.remove(&key);
            self.inserted.insert(key, value);
        }
        previous
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        let previous = self.get(key);
        self.dirty = true;
        self.changed.remove(key);
        self.inserted.remove(key);
        if !self.cleared && self.parent.contains_key(key) {
            self.deleted.insert(key.to_owned());
        }
        previous
    }

    fn clear(&mut self) {
        self.dirty = true;
        self.cleared = true;
        self.changed.clear();
        self.inserted.clear();
        self.deleted.clear();
    }

    fn size_over(&self, parent_size: usize) -> usize {
        let visible = if self.cleared { 0 } else { parent_size };
        visible.saturating_sub(self.deleted.len()) + self.inserted.len()
    }

    /// Detaches the parent frame, leaving a root frame in its place.
    fn take_parent(&mut self) -> Transaction {
        mem::replace(&mut self.parent, Transaction::Root(Arc::clone(&self.store)))
    }

    fn close(mut self, merge: bool) -> Transaction {
        let mut parent = self.take_parent();
        if merge && self.dirty {
            parent.merge(
                self.cleared,
                mem::take(&mut self.changed),
                mem::take(&mut self.inserted),
                mem::take(&mut self.deleted),
            );
        }
        parent
    }
}

impl Drop for TransactionNode {
    // Unlinks the chain level by level so that deep stacks do not recurse.
    fn drop(&mut self) {
        let mut next = self.take_parent();
        while let Transaction::Nested(mut node) = next {
            next = node.take_parent();
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transaction::Root(_) => f.write_str("Root"),
            Transaction::Nested(node) => f
                .debug_struct("Nested")
                .field("changed", &node.changed)
                .field("inserted", &node.inserted)
                .field("deleted", &node.deleted)
                .field("cleared", &node.cleared)
                .field("dirty", &node.dirty)
                .field("depth", &node.depth)
                .finish(),
        }
    }
}
