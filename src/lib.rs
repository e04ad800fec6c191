pub mod config;
pub mod context;
pub mod data_store;
pub mod errors;
pub mod interpreter;
pub mod storage_api;
pub mod tkvs;
pub mod transaction;

// Re-export key types and structs for easier access
pub use config::{Backend, TkvsConfig};
pub use context::{ThreadContexts, TransactionContext};
pub use data_store::base_store::{BaseStore, SharedStore, StoreMutation};
pub use data_store::striped::ConcurrentStore;
pub use data_store::synchronized::SynchronizedStore;
pub use errors::{Result, TkvsError};
pub use interpreter::{Command, CommandInterpreter};
pub use storage_api::{Session, StorageApi, ThreadBoundStorage};
pub use tkvs::Tkvs;
pub use transaction::{Transaction, TransactionNode};
