//! Digital legacy registry.
//!
//! Each legacy is addressed by `derive_legacy_key(owner_id, content_ref)` and
//! starts locked. `unlock` flips it exactly once; nothing flips it back and
//! records are never deleted.

use crate::common::{Hash, LedgerError, Result};
use crate::events::{EventLog, LegacyEvent};
use crate::identity::derive_legacy_key;
use crate::storage::Storage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Storage key prefix for legacy records
pub const LEGACY_PREFIX: &[u8] = b"legacy:";

/// A stored legacy entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyRecord {
    /// Avatar / entity that owns the legacy
    pub owner_id: u64,
    /// Off-chain content identifier (e.g. an IPFS CID)
    pub content_ref: String,
    /// Free-form release rules
    pub rules: String,
    /// Set once by `unlock`, never cleared
    pub unlocked: bool,
}

/// Storage key for a legacy: `legacy:` followed by the 32 key bytes
pub fn record_storage_key(key: &Hash) -> Vec<u8> {
    let mut storage_key = LEGACY_PREFIX.to_vec();
    storage_key.extend_from_slice(key.as_bytes());
    storage_key
}

/// Record store plus unlock guard over a storage backend
#[derive(Debug)]
pub struct LegacyRegistry<S: Storage> {
    storage: S,
    events: EventLog,
}

impl<S: Storage> LegacyRegistry<S> {
    pub fn new(storage: S) -> Self {
        Self::with_events(storage, EventLog::new())
    }

    /// Use a pre-configured event log (e.g. with listeners attached)
    pub fn with_events(storage: S, events: EventLog) -> Self {
        Self { storage, events }
    }

    /// Key a legacy for `(owner_id, content_ref)` would be stored under
    pub fn key_for(&self, owner_id: u64, content_ref: &str) -> Hash {
        derive_legacy_key(owner_id, content_ref)
    }

    /// Create a locked legacy and return its derived key.
    ///
    /// # Errors
    ///
    /// * `LegacyAlreadyExists` if the pair was used before.
    ///
    /// # Events
    ///
    /// * `Created {key, owner_id, content_ref, rules}`
    pub fn create(&mut self, owner_id: u64, content_ref: &str, rules: &str) -> Result<Hash> {
        let key = derive_legacy_key(owner_id, content_ref);
        let storage_key = record_storage_key(&key);

        if self.storage.exists(&storage_key)? {
            warn!("Rejected duplicate legacy {} for owner {}", key, owner_id);
            return Err(LedgerError::LegacyAlreadyExists(key));
        }

        let record = LegacyRecord {
            owner_id,
            content_ref: content_ref.to_string(),
            rules: rules.to_string(),
            unlocked: false,
        };
        self.storage.put(&storage_key, &bincode::serialize(&record)?)?;

        info!("Created legacy {} for owner {}", key, owner_id);
        self.events.emit(LegacyEvent::Created {
            key,
            owner_id,
            content_ref: record.content_ref,
            rules: record.rules,
        });
        Ok(key)
    }

    /// Look up a legacy by key
    pub fn get(&self, key: &Hash) -> Result<LegacyRecord> {
        debug!("Loading legacy {}", key);
        let raw = self
            .storage
            .get(&record_storage_key(key))?
            .ok_or(LedgerError::NotFound(*key))?;
        Ok(bincode::deserialize(&raw)?)
    }

    pub fn contains(&self, key: &Hash) -> Result<bool> {
        Ok(self.storage.exists(&record_storage_key(key))?)
    }

    /// Unlock a legacy. Succeeds at most once per key.
    ///
    /// # Errors
    ///
    /// * `NotFound` if no legacy exists at `key`.
    /// * `AlreadyUnlocked` on every call after the first success.
    ///
    /// # Events
    ///
    /// * `Unlocked {key, owner_id}`
    pub fn unlock(&mut self, key: &Hash) -> Result<()> {
        let mut record = self.get(key)?;
        if record.unlocked {
            warn!("Rejected unlock of already unlocked legacy {}", key);
            return Err(LedgerError::AlreadyUnlocked(*key));
        }

        record.unlocked = true;
        self.storage
            .put(&record_storage_key(key), &bincode::serialize(&record)?)?;

        info!("Unlocked legacy {} for owner {}", key, record.owner_id);
        self.events.emit(LegacyEvent::Unlocked {
            key: *key,
            owner_id: record.owner_id,
        });
        Ok(())
    }

    /// All legacies owned by `owner_id`, ordered by key
    pub fn legacies_of(&self, owner_id: u64) -> Result<Vec<(Hash, LegacyRecord)>> {
        let mut owned = Vec::new();
        for (key, record) in self.all()? {
            if record.owner_id == owner_id {
                owned.push((key, record));
            }
        }
        Ok(owned)
    }

    /// Number of stored legacies
    pub fn record_count(&self) -> Result<usize> {
        Ok(self.storage.list_keys(LEGACY_PREFIX)?.len())
    }

    fn all(&self) -> Result<Vec<(Hash, LegacyRecord)>> {
        let mut records = Vec::new();
        for storage_key in self.storage.list_keys(LEGACY_PREFIX)? {
            let key = Hash::from_slice(&storage_key[LEGACY_PREFIX.len()..])
                .map_err(|e| LedgerError::Codec(e.to_string()))?;
            records.push((key, self.get(&key)?));
        }
        Ok(records)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
