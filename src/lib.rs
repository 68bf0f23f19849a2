#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Error types returned by inserting operations.
pub mod error;

/// A dictionary keyed through a [`KeyAdapter`](key::KeyAdapter).
///
/// This module provides [`ChainMap`], which wraps the [`HashTable`] and
/// stores shared values behind an [`Arc`](alloc::sync::Arc).
pub mod hash_map;

/// The chained hash table engine: slot store, free list and prime-sized
/// bucket array.
pub mod hash_table;

/// Key adapters deciding how keys are copied, hashed and compared.
pub mod key;

pub use error::Error;
pub use hash_map::ChainMap;
pub use hash_table::Handle;
pub use hash_table::HashTable;
pub use key::CStrKey;
pub use key::FixedBytes;
pub use key::FixedKey;
pub use key::KeyAdapter;
pub use key::Utf8Key;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used when none is specified.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used when none is specified.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// Placeholder hasher builder for builds without `std` or `foldhash`.
        ///
        /// It cannot be constructed; pass your own builder to
        /// [`ChainMap::with_hasher`].
        pub enum DefaultHashBuilder {}
    }
}

/// A map from fixed-size plain-data keys, compared as raw bytes.
pub type FixedKeyMap<K, V, S = DefaultHashBuilder> = ChainMap<FixedBytes<K>, V, S>;

/// A map from owned `String` keys, looked up by `&str`.
pub type StringMap<V, S = DefaultHashBuilder> = ChainMap<Utf8Key, V, S>;

/// A map from owned `CString` keys, looked up by `&CStr`.
pub type CStringMap<V, S = DefaultHashBuilder> = ChainMap<CStrKey, V, S>;
