mod error;
mod hash;

pub use error::{ErrorKind, LedgerError, Result};
pub use hash::{Hash, HashParseError};
