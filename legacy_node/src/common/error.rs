use super::Hash;
use crate::storage::StorageError;

/// Errors raised by ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Legacy already exists: {0}")]
    LegacyAlreadyExists(Hash),

    #[error("Legacy already unlocked: {0}")]
    AlreadyUnlocked(Hash),

    #[error("Legacy not found: {0}")]
    NotFound(Hash),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Record codec error: {0}")]
    Codec(String),
}

/// Coarse classification callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Conflict,
    NotFound,
    Storage,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::LegacyAlreadyExists(_) | LedgerError::AlreadyUnlocked(_) => {
                ErrorKind::Conflict
            }
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::Storage(_) | LedgerError::Codec(_) => ErrorKind::Storage,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Codec(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
