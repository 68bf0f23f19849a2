use alloc::borrow::ToOwned;
use alloc::ffi::CString;
use alloc::string::String;
use core::ffi::CStr;
use core::hash::BuildHasher;
use core::marker::PhantomData;

/// Describes how a [`ChainMap`](crate::ChainMap) stores, hashes and compares
/// its keys.
///
/// `Key` is the owned copy kept in each slot. `Lookup` is the borrowed form
/// callers pass in; inserting copies a `Lookup` into a fresh `Key`, and
/// lookups hash and compare the borrowed form directly, so probing a
/// `String`-keyed map with a `&str` never allocates.
pub trait KeyAdapter {
    /// The owned key stored in the map.
    type Key;

    /// The borrowed form used for lookups and inserts.
    type Lookup: ?Sized;

    /// Makes the owned copy stored on insert.
    fn to_key(lookup: &Self::Lookup) -> Self::Key;

    /// Borrows a stored key as its lookup form.
    fn as_lookup(key: &Self::Key) -> &Self::Lookup;

    /// Hashes a key in its lookup form.
    fn hash<S: BuildHasher>(hash_builder: &S, lookup: &Self::Lookup) -> u64;

    /// Compares a stored key with a lookup key.
    fn eq(key: &Self::Key, lookup: &Self::Lookup) -> bool;
}

/// Plain-data types that can be hashed and compared as raw bytes.
///
/// # Safety
///
/// Every byte of an implementing type must be initialized for every value
/// (no padding, no uninitialized bytes), and two values must be equal exactly
/// when their bytes are equal.
pub unsafe trait FixedKey: Copy {}

macro_rules! impl_fixed_key {
    ($($ty:ty),* $(,)?) => {
        $(
            // SAFETY: primitive integers, `bool` and `char` have no padding
            // and compare equal exactly when their bytes do.
            unsafe impl FixedKey for $ty {}
        )*
    };
}

impl_fixed_key!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char,
);

// SAFETY: arrays have no padding between elements, so they inherit the
// guarantees of their element type.
unsafe impl<K: FixedKey, const N: usize> FixedKey for [K; N] {}

fn bytes_of<K: FixedKey>(key: &K) -> &[u8] {
    // SAFETY: `FixedKey` guarantees every byte of `K` is initialized, the
    // pointer comes from a live reference, and the slice borrows `key`.
    unsafe { core::slice::from_raw_parts((key as *const K).cast::<u8>(), size_of::<K>()) }
}

/// Adapter for fixed-size keys stored by value and hashed as raw bytes.
pub struct FixedBytes<K>(PhantomData<fn() -> K>);

impl<K: FixedKey> KeyAdapter for FixedBytes<K> {
    type Key = K;
    type Lookup = K;

    #[inline]
    fn to_key(lookup: &K) -> K {
        *lookup
    }

    #[inline]
    fn as_lookup(key: &K) -> &K {
        key
    }

    #[inline]
    fn hash<S: BuildHasher>(hash_builder: &S, lookup: &K) -> u64 {
        hash_builder.hash_one(bytes_of(lookup))
    }

    #[inline]
    fn eq(key: &K, lookup: &K) -> bool {
        bytes_of(key) == bytes_of(lookup)
    }
}

/// Adapter for owned `String` keys, looked up by `&str`.
pub enum Utf8Key {}

impl KeyAdapter for Utf8Key {
    type Key = String;
    type Lookup = str;

    fn to_key(lookup: &str) -> String {
        lookup.to_owned()
    }

    fn as_lookup(key: &String) -> &str {
        key.as_str()
    }

    fn hash<S: BuildHasher>(hash_builder: &S, lookup: &str) -> u64 {
        hash_builder.hash_one(lookup)
    }

    fn eq(key: &String, lookup: &str) -> bool {
        key.as_str() == lookup
    }
}

/// Adapter for NUL-terminated keys, duplicated into an owned `CString` on
/// insert and looked up by `&CStr`.
///
/// The terminator is not hashed, so hashing matches the byte content only.
pub enum CStrKey {}

impl KeyAdapter for CStrKey {
    type Key = CString;
    type Lookup = CStr;

    fn to_key(lookup: &CStr) -> CString {
        lookup.to_owned()
    }

    fn as_lookup(key: &CString) -> &CStr {
        key.as_c_str()
    }

    fn hash<S: BuildHasher>(hash_builder: &S, lookup: &CStr) -> u64 {
        hash_builder.hash_one(lookup.to_bytes())
    }

    fn eq(key: &CString, lookup: &CStr) -> bool {
        key.as_c_str() == lookup
    }
}
