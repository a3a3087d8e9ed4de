//! Content-addressed digital legacy ledger.
//!
//! Legacies are keyed by `keccak256(owner_id, content_ref)`, created locked,
//! and unlocked exactly once.

pub mod common;
pub mod config;
pub mod events;
pub mod identity;
pub mod ledger;
pub mod storage;

pub use common::{ErrorKind, Hash, LedgerError, Result};
pub use config::NodeConfig;
pub use events::{EventLog, LegacyEvent};
pub use identity::derive_legacy_key;
pub use ledger::{LegacyRecord, LegacyRegistry};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
