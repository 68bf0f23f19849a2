use core::fmt;

use thiserror::Error;

use crate::hash_table::Handle;

/// The backing array that failed to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    /// The prime-sized array of chain heads.
    Buckets,
    /// The slot store holding keys, values and links.
    Slots,
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Buckets => f.write_str("bucket table"),
            Storage::Slots => f.write_str("slot store"),
        }
    }
}

/// Errors reported by inserting operations.
///
/// Lookups never fail: an absent key or a stale [`Handle`] is reported as
/// `None` or `false` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The key is already present and overwriting was not requested. The map
    /// is unchanged.
    #[error("key already present at slot {}", .handle.index())]
    DuplicateKey {
        /// Handle of the entry that already holds the key.
        handle: Handle,
    },

    /// Growing a backing array failed. The container keeps its last
    /// committed state.
    #[error("failed to grow the {storage} to {requested} entries")]
    AllocFailed {
        /// Which array could not be grown.
        storage: Storage,
        /// The entry count that was requested.
        requested: usize,
    },
}

impl Error {
    /// Returns `true` for [`Error::DuplicateKey`].
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Error::DuplicateKey { .. })
    }
}
