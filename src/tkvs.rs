use std::sync::Arc;

use log::debug;

use crate::config::TkvsConfig;
use crate::context::ThreadContexts;
use crate::data_store::base_store::SharedStore;
use crate::data_store::striped::ConcurrentStore;
use crate::data_store::synchronized::SynchronizedStore;
use crate::errors::Result;
use crate::interpreter::CommandInterpreter;
use crate::storage_api::{Session, ThreadBoundStorage};

/// Tkvs Prelude
pub mod prelude {
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::data_store::base_store::*;
    pub use crate::data_store::striped::*;
    pub use crate::data_store::synchronized::*;
    pub use crate::errors::*;
    pub use crate::interpreter::*;
    pub use crate::storage_api::*;
    pub use crate::transaction::*;
    pub use crate::*;
}

/// The main entry point: one shared base store and the execution contexts
/// layered over it.
pub struct Tkvs {
    /// The base store every context eventually commits into.
    store: SharedStore,
    /// Contexts for [`Tkvs::thread_bound`] handles, keyed by thread.
    thread_contexts: Arc<ThreadContexts>,
}

impl Tkvs {
    pub fn new(store: SharedStore) -> Self {
        Self {
            thread_contexts: Arc::new(ThreadContexts::new(Arc::clone(&store))),
            store,
        }
    }

    /// A store backed by a single-lock map.
    pub fn synchronized() -> Self {
        Self::new(Arc::new(SynchronizedStore::new()))
    }

    /// A store backed by a lock-striped map.
    pub fn concurrent() -> Self {
        Self::new(Arc::new(ConcurrentStore::new()))
    }

    pub fn from_config(config: &TkvsConfig) -> Result<Self> {
        config.validate()?;
        debug!("Building {:?} store with {} shards", config.backend, config.shards);
        Ok(Self::new(config.build_store()))
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Opens a new, independent execution context starting at root.
    pub fn session(&self) -> Session {
        Session::new(Arc::clone(&self.store))
    }

    /// A handle whose execution context is the calling thread. All handles
    /// from the same `Tkvs` share one set of per-thread contexts.
    pub fn thread_bound(&self) -> ThreadBoundStorage {
        ThreadBoundStorage::from_contexts(Arc::clone(&self.thread_contexts))
    }

    /// A command interpreter over a fresh session.
    pub fn cli(&self) -> CommandInterpreter<Session> {
        CommandInterpreter::new(self.session())
    }
}

impl Default for Tkvs {
    fn default() -> Self {
        Self::concurrent()
    }
}
