//! Ledger Module
//! Content-addressed legacy records and their single-use unlock guard

pub mod legacy;

// Re-export main types
pub use legacy::{record_storage_key, LegacyRecord, LegacyRegistry, LEGACY_PREFIX};
