//! Snapshot-backed storage.
//!
//! The whole key space is held in memory and written to a single JSON file on
//! `flush`. The snapshot is replaced by renaming a temporary file from the same
//! directory over it; it is never written in place.
//!
//! An open `FileStorage` holds an exclusive advisory lock on `<snapshot>.lock`
//! until it is dropped, so a second handle on the same snapshot is refused
//! instead of overwriting the first one's flush.

use super::{MemoryStorage, Result, Storage, StorageError, StorageStats};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    /// hex(key) -> hex(value)
    entries: BTreeMap<String, String>,
}

/// Storage persisted as a JSON snapshot on disk
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    inner: MemoryStorage,
    dirty: bool,
    // released on drop
    _lock: File,
}

impl FileStorage {
    /// Open the snapshot at `path`, starting empty if the file does not exist.
    ///
    /// Fails with [`StorageError::Locked`] while another handle holds the
    /// snapshot open.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock = acquire_lock(&lock_path(&path))?;
        let inner = if path.exists() {
            let raw = fs::read(&path)?;
            let data = decode_snapshot(&raw)?;
            info!("Loaded {} entries from {}", data.len(), path.display());
            MemoryStorage::from_map(data)
        } else {
            debug!("No snapshot at {}, starting empty", path.display());
            MemoryStorage::new()
        };

        Ok(Self {
            path,
            inner,
            dirty: false,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are writes not yet flushed to disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn write_snapshot(&self) -> Result<()> {
        let dir = parent_dir(&self.path);
        fs::create_dir_all(&dir)?;

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            entries: self
                .inner
                .entries()
                .iter()
                .map(|(k, v)| (hex::encode(k), hex::encode(v)))
                .collect(),
        };

        let tmp = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &snapshot)
                .map_err(|e| StorageError::WriteError(e.to_string()))?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn lock_path(snapshot: &Path) -> PathBuf {
    let mut name = snapshot.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn acquire_lock(lock_path: &Path) -> Result<File> {
    fs::create_dir_all(parent_dir(lock_path))?;
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(lock_path)?;
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => Ok(file),
        Err(err) if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            warn!("Snapshot lock {} is held elsewhere", lock_path.display());
            Err(StorageError::Locked(lock_path.display().to_string()))
        }
        Err(err) => Err(StorageError::Io(err)),
    }
}

fn decode_snapshot(raw: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
    let snapshot: Snapshot =
        serde_json::from_slice(raw).map_err(|e| StorageError::InvalidData(e.to_string()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(StorageError::InvalidData(format!(
            "unsupported snapshot version {}",
            snapshot.version
        )));
    }

    snapshot
        .entries
        .into_iter()
        .map(|(k, v)| {
            let key = hex::decode(&k).map_err(|e| StorageError::InvalidData(e.to_string()))?;
            let value = hex::decode(&v).map_err(|e| StorageError::InvalidData(e.to_string()))?;
            Ok((key, value))
        })
        .collect()
}

impl Storage for FileStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.put(key, value)?;
        self.dirty = true;
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        self.inner.exists(key)
    }

    fn list_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        self.inner.list_keys(prefix)
    }

    fn get_stats(&self) -> Result<StorageStats> {
        self.inner.get_stats()
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.write_snapshot()?;
        self.dirty = false;
        debug!(
            "Flushed {} entries to {}",
            self.inner.len(),
            self.path.display()
        );
        Ok(())
    }
}
