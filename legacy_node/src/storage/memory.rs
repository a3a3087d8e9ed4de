use super::{Result, Storage, StorageStats};
use std::cell::Cell;
use std::collections::BTreeMap;

/// Simple in-memory storage implementation for testing
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    reads: Cell<u64>,
    writes: u64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an existing map (used when loading snapshots)
    pub(crate) fn from_map(data: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub(crate) fn entries(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.writes += 1;
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.data.contains_key(key))
    }

    fn list_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let keys = self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        Ok(keys)
    }

    fn get_stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            num_entries: self.data.len() as u64,
            total_size: self.data.values().map(|v| v.len() as u64).sum(),
            read_operations: self.reads.get(),
            write_operations: self.writes,
        })
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let mut storage = MemoryStorage::new();
        storage.put(b"a", b"1").unwrap();
        assert_eq!(storage.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(storage.get(b"b").unwrap(), None);
        assert!(storage.exists(b"a").unwrap());
    }

    #[test]
    fn list_keys_respects_prefix_and_order() {
        let mut storage = MemoryStorage::new();
        storage.put(b"legacy:b", b"").unwrap();
        storage.put(b"legacy:a", b"").unwrap();
        storage.put(b"other:a", b"").unwrap();
        storage.put(b"legacz", b"").unwrap();

        let keys = storage.list_keys(b"legacy:").unwrap();
        assert_eq!(keys, vec![b"legacy:a".to_vec(), b"legacy:b".to_vec()]);
    }

    #[test]
    fn stats_track_operations() {
        let mut storage = MemoryStorage::new();
        storage.put(b"k", b"value").unwrap();
        storage.get(b"k").unwrap();
        storage.get(b"missing").unwrap();

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.num_entries, 1);
        assert_eq!(stats.total_size, 5);
        assert_eq!(stats.read_operations, 2);
        assert_eq!(stats.write_operations, 1);
    }

    #[test]
    fn exists_counts_as_a_read() {
        let mut storage = MemoryStorage::new();
        storage.put(b"k", b"v").unwrap();
        assert!(storage.exists(b"k").unwrap());
        assert!(!storage.exists(b"missing").unwrap());
        storage.get(b"k").unwrap();

        assert_eq!(storage.get_stats().unwrap().read_operations, 3);
    }
}
