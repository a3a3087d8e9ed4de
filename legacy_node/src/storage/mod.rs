use serde::{Deserialize, Serialize};

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

// Storage-specific Result type
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Write error: {0}")]
    WriteError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Ledger locked by another process: {0}")]
    Locked(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub num_entries: u64,
    pub total_size: u64,
    pub read_operations: u64,
    pub write_operations: u64,
}

/// Key-value backend for ledger state.
///
/// Writes take `&mut self`: one writer at a time, serialized by the caller.
/// Entries are never removed.
pub trait Storage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;
    fn exists(&self, key: &[u8]) -> Result<bool>;
    /// Keys starting with `prefix`, in ascending byte order
    fn list_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>>;
    fn get_stats(&self) -> Result<StorageStats>;
    fn flush(&mut self) -> Result<()>;
}

macro_rules! forward_storage {
    ($ty:ty) => {
        impl<S: Storage + ?Sized> Storage for $ty {
            fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
                (**self).get(key)
            }

            fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
                (**self).put(key, value)
            }

            fn exists(&self, key: &[u8]) -> Result<bool> {
                (**self).exists(key)
            }

            fn list_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
                (**self).list_keys(prefix)
            }

            fn get_stats(&self) -> Result<StorageStats> {
                (**self).get_stats()
            }

            fn flush(&mut self) -> Result<()> {
                (**self).flush()
            }
        }
    };
}

forward_storage!(Box<S>);
forward_storage!(&mut S);
