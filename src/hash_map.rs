use alloc::sync::Arc;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::DefaultHashBuilder;
use crate::error::Error;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::Handle;
use crate::hash_table::HashTable;
use crate::key::KeyAdapter;

/// A dictionary built on the chained [`HashTable`].
///
/// `ChainMap<A, V, S>` maps keys to shared values. The key adapter `A`
/// decides how keys are stored and compared (see [`crate::key`]), and `S`
/// builds the hasher. Values live behind an [`Arc`]: storing retains, and
/// removing, overwriting or clearing releases, so a value outlives the map
/// while anyone else still holds it.
///
/// Every insert hands back a [`Handle`] that resolves in O(1) through
/// [`key_at`](Self::key_at) and [`value_at`](Self::value_at) until the key is
/// removed. Handles of removed keys never resolve again, even once their slot
/// has been reused.
///
/// Most code uses one of the aliases [`FixedKeyMap`](crate::FixedKeyMap),
/// [`StringMap`](crate::StringMap) or [`CStringMap`](crate::CStringMap).
///
/// # Examples
///
/// ```rust
/// use slot_chain::StringMap;
///
/// let mut map: StringMap<u32> = StringMap::new();
/// let handle = map.insert("answer", 42).unwrap();
///
/// assert_eq!(map.get("answer"), Some(&42));
/// assert_eq!(map.key_at(handle).map(String::as_str), Some("answer"));
/// assert!(map.insert("answer", 0).is_err());
/// ```
pub struct ChainMap<A: KeyAdapter, V, S = DefaultHashBuilder> {
    table: HashTable<(A::Key, Arc<V>)>,
    hash_builder: S,
    _adapter: PhantomData<fn() -> A>,
}

impl<A, V, S> Clone for ChainMap<A, V, S>
where
    A: KeyAdapter,
    A::Key: Clone,
    S: Clone,
{
    /// Clones the map slot for slot, so handles issued by `self` resolve the
    /// same way in the clone. Values are shared, not deep-copied.
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            hash_builder: self.hash_builder.clone(),
            _adapter: PhantomData,
        }
    }
}

impl<A, V, S> Debug for ChainMap<A, V, S>
where
    A: KeyAdapter,
    A::Key: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<A: KeyAdapter, V, S> ChainMap<A, V, S> {
    /// Creates an empty map using `hash_builder`. Nothing is allocated until
    /// the first insert.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates a map that can hold `capacity` entries without rehashing.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
            _adapter: PhantomData,
        }
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the allocated slot capacity.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of buckets, `0` before the first insert.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes every entry, releasing all values and freeing the backing
    /// storage.
    ///
    /// Handles issued before the call never resolve again.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Makes room for `additional` more entries without further allocation
    /// or rehashing.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), Error> {
        self.table.try_reserve(additional)
    }

    /// Returns the key stored behind `handle`, or `None` if the handle is
    /// out of range or its entry has been removed.
    pub fn key_at(&self, handle: Handle) -> Option<&A::Key> {
        self.table.get(handle).map(|(k, _)| k)
    }

    /// Returns a retained reference to the value behind `handle`.
    pub fn value_at(&self, handle: Handle) -> Option<Arc<V>> {
        self.table.get(handle).map(|(_, v)| Arc::clone(v))
    }

    /// Removes the entry behind `handle` without hashing.
    pub fn remove_at(&mut self, handle: Handle) -> Option<(A::Key, Arc<V>)> {
        self.table.remove_handle(handle)
    }

    /// Returns an iterator over the key-value pairs in slot order.
    ///
    /// The iterator borrows the map, so the map cannot change during a
    /// traversal.
    pub fn iter(&self) -> Iter<'_, A, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, A, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, A, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over the keys together with their handles.
    pub fn handles(&self) -> Handles<'_, A, V> {
        Handles {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator that removes and yields every entry.
    ///
    /// The map is empty as soon as this returns; entries the iterator does
    /// not yield are released when it is dropped.
    pub fn drain(&mut self) -> Drain<'_, A, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Returns chain depth statistics.
    ///
    /// Only available with the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> crate::hash_table::ChainStats {
        self.table.stats()
    }
}

impl<A, V, S> ChainMap<A, V, S>
where
    A: KeyAdapter,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &A::Lookup) -> u64 {
        A::hash(&self.hash_builder, key)
    }

    /// Inserts a new key.
    ///
    /// The key is copied into the map; `value` may be a `V` or an existing
    /// `Arc<V>` to share. Fails with [`Error::DuplicateKey`] if the key is
    /// already present, leaving the map unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use slot_chain::StringMap;
    /// # use slot_chain::error::Error;
    /// #
    /// let mut map: StringMap<&str> = StringMap::new();
    /// let first = map.insert("a", "one").unwrap();
    ///
    /// assert_eq!(
    ///     map.insert("a", "two"),
    ///     Err(Error::DuplicateKey { handle: first })
    /// );
    /// assert_eq!(map.get("a"), Some(&"one"));
    /// ```
    pub fn insert(&mut self, key: &A::Lookup, value: impl Into<Arc<V>>) -> Result<Handle, Error> {
        self.insert_impl(key, value.into(), false)
    }

    /// Inserts a key, replacing the value if the key is already present.
    ///
    /// An existing entry keeps its slot, so the returned handle is the one
    /// issued when the key was first inserted. The old value is released.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use slot_chain::StringMap;
    /// #
    /// let mut map: StringMap<i32> = StringMap::new();
    /// let a = map.insert("a", 1).unwrap();
    /// map.insert("b", 2).unwrap();
    ///
    /// assert_eq!(map.insert_or_replace("a", 3), Ok(a));
    /// assert_eq!(map.get("a"), Some(&3));
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn insert_or_replace(
        &mut self,
        key: &A::Lookup,
        value: impl Into<Arc<V>>,
    ) -> Result<Handle, Error> {
        self.insert_impl(key, value.into(), true)
    }

    fn insert_impl(
        &mut self,
        key: &A::Lookup,
        value: Arc<V>,
        overwrite: bool,
    ) -> Result<Handle, Error> {
        let hash = self.hash(key);
        match self.table.entry(hash, |(k, _)| A::eq(k, key)) {
            TableEntry::Occupied(mut entry) => {
                if !overwrite {
                    return Err(Error::DuplicateKey {
                        handle: entry.handle(),
                    });
                }
                entry.get_mut().1 = value;
                Ok(entry.handle())
            }
            TableEntry::Vacant(entry) => entry.insert((A::to_key(key), value)),
        }
    }

    /// Returns a reference to the value for `key`.
    pub fn get(&self, key: &A::Lookup) -> Option<&V> {
        let hash = self.hash(key);
        self.table
            .find(hash, |(k, _)| A::eq(k, key))
            .map(|(_, v)| v.as_ref())
    }

    /// Returns a retained reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// #
    /// # use slot_chain::StringMap;
    /// #
    /// let shared = Arc::new(vec![1, 2, 3]);
    /// let mut map: StringMap<Vec<i32>> = StringMap::new();
    /// map.insert("list", Arc::clone(&shared)).unwrap();
    ///
    /// let found = map.retrieve("list").unwrap();
    /// assert!(Arc::ptr_eq(&found, &shared));
    /// assert_eq!(Arc::strong_count(&shared), 3);
    /// ```
    pub fn retrieve(&self, key: &A::Lookup) -> Option<Arc<V>> {
        let hash = self.hash(key);
        self.table
            .find(hash, |(k, _)| A::eq(k, key))
            .map(|(_, v)| Arc::clone(v))
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key(&self, key: &A::Lookup) -> bool {
        self.handle_of(key).is_some()
    }

    /// Returns the handle of `key`.
    pub fn handle_of(&self, key: &A::Lookup) -> Option<Handle> {
        let hash = self.hash(key);
        self.table.find_handle(hash, |(k, _)| A::eq(k, key))
    }

    /// Removes `key`, returning whether it was present.
    ///
    /// The freed slot is the first one reused by a later insert.
    pub fn remove(&mut self, key: &A::Lookup) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Removes `key`, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &A::Lookup) -> Option<(A::Key, Arc<V>)> {
        let hash = self.hash(key);
        self.table.remove(hash, |(k, _)| A::eq(k, key))
    }

    /// Clears `target` and inserts a copy of every entry of `self`.
    ///
    /// Keys are copied, values are shared. The maps are independent
    /// afterwards: inserting into or removing from one does not affect the
    /// other. `target` may use a different hasher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use slot_chain::StringMap;
    /// #
    /// let mut original: StringMap<i32> = StringMap::new();
    /// original.insert("a", 1).unwrap();
    ///
    /// let mut copy: StringMap<i32> = StringMap::new();
    /// copy.insert("stale", 0).unwrap();
    /// original.copy_to(&mut copy).unwrap();
    ///
    /// copy.remove("a");
    /// assert_eq!(original.get("a"), Some(&1));
    /// assert!(!copy.contains_key("stale"));
    /// ```
    pub fn copy_to<T: BuildHasher>(&self, target: &mut ChainMap<A, V, T>) -> Result<(), Error> {
        target.clear();
        target.try_reserve(self.len())?;
        for (key, value) in self.iter() {
            target.insert(A::as_lookup(key), Arc::clone(value))?;
        }
        Ok(())
    }
}

impl<A, V, S> ChainMap<A, V, S>
where
    A: KeyAdapter,
    S: BuildHasher + Default,
{
    /// Creates an empty map using the default hasher builder.
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a map that can hold `capacity` entries without rehashing,
    /// using the default hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<A, V, S> Default for ChainMap<A, V, S>
where
    A: KeyAdapter,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, A: KeyAdapter, V, S> IntoIterator for &'a ChainMap<A, V, S> {
    type Item = (&'a A::Key, &'a Arc<V>);
    type IntoIter = Iter<'a, A, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the key-value pairs of a [`ChainMap`].
pub struct Iter<'a, A: KeyAdapter, V> {
    inner: crate::hash_table::Iter<'a, (A::Key, Arc<V>)>,
}

impl<'a, A: KeyAdapter, V> Iterator for Iter<'a, A, V> {
    type Item = (&'a A::Key, &'a Arc<V>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, (k, v))| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A: KeyAdapter, V> ExactSizeIterator for Iter<'_, A, V> {}

impl<A: KeyAdapter, V> FusedIterator for Iter<'_, A, V> {}

/// An iterator over the keys of a [`ChainMap`].
pub struct Keys<'a, A: KeyAdapter, V> {
    inner: Iter<'a, A, V>,
}

impl<'a, A: KeyAdapter, V> Iterator for Keys<'a, A, V> {
    type Item = &'a A::Key;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A: KeyAdapter, V> ExactSizeIterator for Keys<'_, A, V> {}

impl<A: KeyAdapter, V> FusedIterator for Keys<'_, A, V> {}

/// An iterator over the values of a [`ChainMap`].
pub struct Values<'a, A: KeyAdapter, V> {
    inner: Iter<'a, A, V>,
}

impl<'a, A: KeyAdapter, V> Iterator for Values<'a, A, V> {
    type Item = &'a Arc<V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A: KeyAdapter, V> ExactSizeIterator for Values<'_, A, V> {}

impl<A: KeyAdapter, V> FusedIterator for Values<'_, A, V> {}

/// An iterator over the keys of a [`ChainMap`] with their handles.
pub struct Handles<'a, A: KeyAdapter, V> {
    inner: crate::hash_table::Iter<'a, (A::Key, Arc<V>)>,
}

impl<'a, A: KeyAdapter, V> Iterator for Handles<'a, A, V> {
    type Item = (Handle, &'a A::Key);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(handle, (k, _))| (handle, k))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A: KeyAdapter, V> ExactSizeIterator for Handles<'_, A, V> {}

impl<A: KeyAdapter, V> FusedIterator for Handles<'_, A, V> {}

/// A draining iterator over the entries of a [`ChainMap`].
pub struct Drain<'a, A: KeyAdapter, V> {
    inner: crate::hash_table::Drain<'a, (A::Key, Arc<V>)>,
}

impl<A: KeyAdapter, V> Iterator for Drain<'_, A, V> {
    type Item = (A::Key, Arc<V>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A: KeyAdapter, V> ExactSizeIterator for Drain<'_, A, V> {}

impl<A: KeyAdapter, V> FusedIterator for Drain<'_, A, V> {}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;
    use core::hash::Hasher;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::key::CStrKey;
    use crate::key::FixedBytes;
    use crate::key::Utf8Key;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    /// Sends every key to the same bucket.
    #[derive(Clone, Default)]
    struct ZeroHashBuilder;

    struct ZeroHasher;

    impl Hasher for ZeroHasher {
        fn finish(&self) -> u64 {
            0
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    impl BuildHasher for ZeroHashBuilder {
        type Hasher = ZeroHasher;

        fn build_hasher(&self) -> ZeroHasher {
            ZeroHasher
        }
    }

    type StrMap<V> = ChainMap<Utf8Key, V, SipHashBuilder>;

    #[test]
    fn test_new_and_with_hasher() {
        let map: StrMap<i32> = ChainMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.capacity(), 0);

        let map2 = ChainMap::<Utf8Key, i32, _>::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
    }

    #[test]
    fn test_with_capacity() {
        let map: StrMap<i32> = ChainMap::with_capacity(100);
        assert!(map.capacity() >= 100);
        assert!(map.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let mut map: StrMap<String> = ChainMap::new();
        let handle = map.insert("hello", "world".to_string()).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("hello"), Some(&"world".to_string()));
        assert_eq!(map.retrieve("hello").as_deref(), Some(&"world".to_string()));
        assert_eq!(map.handle_of("hello"), Some(handle));
        assert_eq!(map.key_at(handle).map(String::as_str), Some("hello"));
        assert_eq!(
            map.value_at(handle).as_deref().map(String::as_str),
            Some("world")
        );
        assert_eq!(map.get("missing"), None);
        assert!(map.retrieve("missing").is_none());
        assert!(map.handle_of("missing").is_none());
    }

    #[test]
    fn test_overwrite_scenario() {
        let mut map: StrMap<i32> = ChainMap::new();
        let a = map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();
        assert_eq!(map.insert_or_replace("a", 3), Ok(a));

        assert_eq!(map.retrieve("a").as_deref(), Some(&3));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_duplicate_scenario() {
        let mut map: StrMap<i32> = ChainMap::new();
        let a = map.insert("a", 1).unwrap();

        let err = map.insert("a", 1).unwrap_err();
        assert_eq!(err, Error::DuplicateKey { handle: a });
        assert!(err.is_duplicate_key());
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a"), Some(&1));
    }

    #[test]
    fn test_remove_twice() {
        let mut map: StrMap<i32> = ChainMap::new();
        map.insert("k", 7).unwrap();

        assert!(map.remove("k"));
        assert_eq!(map.retrieve("k"), None);
        assert!(!map.remove("k"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_remove_entry() {
        let mut map: StrMap<i32> = ChainMap::new();
        map.insert("k", 7).unwrap();

        let (key, value) = map.remove_entry("k").unwrap();
        assert_eq!(key, "k");
        assert_eq!(*value, 7);
        assert!(map.remove_entry("k").is_none());
    }

    #[test]
    fn test_free_list_reuse() {
        let mut map: StrMap<i32> = ChainMap::new();
        map.insert("x", 1).unwrap();
        let x = map.handle_of("x").unwrap();
        assert!(map.remove("x"));
        map.insert("y", 2).unwrap();
        let y = map.handle_of("y").unwrap();

        assert_eq!(y.index(), x.index());
        assert_ne!(y, x);
        assert!(map.key_at(x).is_none());
        assert!(map.value_at(x).is_none());
        assert_eq!(map.key_at(y).map(String::as_str), Some("y"));
    }

    #[test]
    fn test_handles_are_stable() {
        let mut map: StrMap<i32> = ChainMap::new();
        let keep = map.insert("keep", -1).unwrap();

        for i in 0..500 {
            map.insert(&format!("key_{i}"), i).unwrap();
        }
        for i in (0..500).step_by(3) {
            assert!(map.remove(&format!("key_{i}")));
        }
        for i in 500..700 {
            map.insert(&format!("key_{i}"), i).unwrap();
        }

        assert_eq!(map.key_at(keep).map(String::as_str), Some("keep"));
        assert_eq!(map.value_at(keep).as_deref(), Some(&-1));
        assert_eq!(map.handle_of("keep"), Some(keep));
    }

    #[test]
    fn test_fifty_keys_grow_both_arrays() {
        let mut map: StrMap<usize> = ChainMap::new();
        map.insert("key_0", 0).unwrap();
        let initial_buckets = map.bucket_count();
        let initial_capacity = map.capacity();
        assert_eq!(initial_buckets, 11);
        assert!(initial_capacity >= 32);

        for i in 1..50 {
            map.insert(&format!("key_{i}"), i).unwrap();
        }

        assert!(map.bucket_count() > initial_buckets);
        assert!(map.capacity() >= 50);
        assert_eq!(map.len(), 50);
        for i in 0..50 {
            assert_eq!(map.get(&format!("key_{i}")), Some(&i));
        }
    }

    #[test]
    fn test_rehash_preserves_mappings() {
        let mut map: StrMap<usize> = ChainMap::new();
        for i in 0..33 {
            map.insert(&format!("key_{i}"), i).unwrap();
        }
        let buckets = map.bucket_count();

        let mut i = 33;
        while map.bucket_count() == buckets {
            map.insert(&format!("key_{i}"), i).unwrap();
            i += 1;
        }

        for k in 0..i {
            assert_eq!(map.get(&format!("key_{k}")), Some(&k));
        }
    }

    #[test]
    fn test_copy_to_is_independent() {
        let mut original: StrMap<i32> = ChainMap::new();
        for i in 0..40 {
            original.insert(&format!("key_{i}"), i).unwrap();
        }
        original.remove("key_3");

        let mut copy: ChainMap<Utf8Key, i32, ZeroHashBuilder> = ChainMap::new();
        copy.insert("leftover", 0).unwrap();
        original.copy_to(&mut copy).unwrap();

        assert_eq!(copy.len(), 39);
        assert!(!copy.contains_key("leftover"));
        for i in (0..40).filter(|i| *i != 3) {
            assert_eq!(copy.get(&format!("key_{i}")), Some(&i));
        }

        copy.remove("key_0");
        copy.insert("only_in_copy", 1).unwrap();
        assert_eq!(original.get("key_0"), Some(&0));
        assert!(!original.contains_key("only_in_copy"));

        original.remove("key_1");
        original.insert_or_replace("key_2", 200).unwrap();
        assert_eq!(copy.get("key_1"), Some(&1));
        assert_eq!(copy.get("key_2"), Some(&2));
    }

    #[test]
    fn test_values_are_shared() {
        let value = Arc::new(String::from("shared"));
        let mut map: StrMap<String> = ChainMap::new();

        map.insert("a", Arc::clone(&value)).unwrap();
        map.insert("b", Arc::clone(&value)).unwrap();
        assert_eq!(Arc::strong_count(&value), 3);

        let held = map.retrieve("a").unwrap();
        assert_eq!(Arc::strong_count(&value), 4);
        drop(held);

        map.insert_or_replace("a", String::from("other")).unwrap();
        assert_eq!(Arc::strong_count(&value), 2);

        let mut copy: StrMap<String> = ChainMap::new();
        map.copy_to(&mut copy).unwrap();
        assert_eq!(Arc::strong_count(&value), 3);

        assert!(map.remove("b"));
        assert_eq!(Arc::strong_count(&value), 2);

        copy.clear();
        assert_eq!(Arc::strong_count(&value), 1);
    }

    #[test]
    fn test_clear() {
        let mut map: StrMap<i32> = ChainMap::new();
        let handle = map.insert("hello", 1).unwrap();
        map.insert("world", 2).unwrap();

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 0);
        assert_eq!(map.bucket_count(), 0);
        assert!(!map.contains_key("hello"));
        assert!(map.key_at(handle).is_none());

        let again = map.insert("hello", 3).unwrap();
        assert_ne!(again, handle);
        assert_eq!(map.get("hello"), Some(&3));
    }

    #[test]
    fn test_remove_at() {
        let mut map: StrMap<i32> = ChainMap::new();
        let a = map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();

        let (key, value) = map.remove_at(a).unwrap();
        assert_eq!(key, "a");
        assert_eq!(*value, 1);
        assert!(map.remove_at(a).is_none());
        assert!(!map.contains_key("a"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_iterators() {
        let mut map: StrMap<i32> = ChainMap::new();
        map.insert("one", 1).unwrap();
        map.insert("two", 2).unwrap();
        map.insert("three", 3).unwrap();
        map.remove("two");

        let pairs: std::collections::HashMap<String, i32> =
            map.iter().map(|(k, v)| (k.clone(), **v)).collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.get("one"), Some(&1));
        assert_eq!(pairs.get("three"), Some(&3));
        assert_eq!(map.iter().len(), 2);

        let keys: std::collections::HashSet<&str> = map.keys().map(String::as_str).collect();
        assert!(keys.contains("one") && keys.contains("three"));

        let mut values: Vec<i32> = map.values().map(|v| **v).collect();
        values.sort();
        assert_eq!(values, [1, 3]);

        for (handle, key) in map.handles() {
            assert_eq!(map.key_at(handle), Some(key));
        }
        assert_eq!((&map).into_iter().count(), 2);
    }

    #[test]
    fn test_failed_reserve_keeps_map() {
        let mut map: StrMap<i32> = ChainMap::new();
        let a = map.insert("a", 1).unwrap();
        let capacity = map.capacity();

        let err = map.try_reserve(usize::MAX).unwrap_err();
        assert!(
            matches!(
                err,
                Error::AllocFailed {
                    storage: crate::error::Storage::Slots,
                    ..
                }
            ),
            "{err:?}"
        );

        assert_eq!(map.len(), 1);
        assert_eq!(map.capacity(), capacity);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.handle_of("a"), Some(a));
        assert_eq!(map.key_at(a).map(String::as_str), Some("a"));
        map.insert("b", 2).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_copy_to_after_failed_reserve() {
        let mut original: StrMap<i32> = ChainMap::new();
        for i in 0..20 {
            original.insert(&format!("key_{i}"), i).unwrap();
        }

        let mut target: StrMap<i32> = ChainMap::new();
        target.insert("leftover", 0).unwrap();
        assert!(target.try_reserve(usize::MAX).is_err());
        assert_eq!(target.get("leftover"), Some(&0));

        original.copy_to(&mut target).unwrap();
        assert_eq!(target.len(), 20);
        assert!(!target.contains_key("leftover"));
        for i in 0..20 {
            assert_eq!(target.get(&format!("key_{i}")), Some(&i));
        }
        assert_eq!(original.len(), 20);
    }

    #[test]
    fn test_iterator_lengths() {
        let mut map: StrMap<i32> = ChainMap::new();
        for i in 0..10 {
            map.insert(&format!("key_{i}"), i).unwrap();
        }
        map.remove("key_4");

        assert_eq!(map.keys().len(), 9);
        assert_eq!(map.values().len(), 9);
        assert_eq!(map.handles().len(), 9);

        let mut keys = map.keys();
        keys.by_ref().for_each(drop);
        assert!(keys.next().is_none());

        let mut drain = map.drain();
        assert_eq!(drain.len(), 9);
        drain.next().unwrap();
        assert_eq!(drain.size_hint(), (8, Some(8)));
    }

    #[test]
    fn test_drain() {
        let mut map: StrMap<i32> = ChainMap::new();
        let handle = map.insert("one", 1).unwrap();
        map.insert("two", 2).unwrap();

        let drained: std::collections::HashMap<String, i32> =
            map.drain().map(|(k, v)| (k, *v)).collect();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained.get("two"), Some(&2));
        assert!(map.is_empty());
        assert!(map.key_at(handle).is_none());
    }

    #[test]
    fn test_clone_keeps_handles() {
        let mut map: StrMap<i32> = ChainMap::new();
        let a = map.insert("a", 1).unwrap();
        let cloned = map.clone();

        assert_eq!(cloned.key_at(a).map(String::as_str), Some("a"));
        map.remove("a");
        assert!(map.key_at(a).is_none());
        assert_eq!(cloned.get("a"), Some(&1));
    }

    #[test]
    fn test_debug() {
        let mut map: StrMap<i32> = ChainMap::new();
        map.insert("a", 1).unwrap();
        assert_eq!(format!("{map:?}"), r#"{"a": 1}"#);
    }

    #[test]
    fn test_total_collision() {
        let mut map: ChainMap<Utf8Key, usize, ZeroHashBuilder> = ChainMap::new();
        for i in 0..200 {
            map.insert(&format!("key_{i}"), i).unwrap();
        }
        for i in (0..200).step_by(2) {
            assert!(map.remove(&format!("key_{i}")));
        }
        for i in 0..200 {
            assert_eq!(map.get(&format!("key_{i}")).is_some(), i % 2 == 1);
        }
        assert_eq!(map.len(), 100);
    }

    #[test]
    fn test_fixed_keys() {
        let mut map: ChainMap<FixedBytes<u64>, &str, SipHashBuilder> = ChainMap::new();
        let handle = map.insert(&7, "seven").unwrap();
        map.insert(&8, "eight").unwrap();

        assert_eq!(map.get(&7), Some(&"seven"));
        assert_eq!(map.key_at(handle), Some(&7));
        assert!(map.insert(&7, "again").is_err());
        assert!(map.remove(&8));
        assert_eq!(map.get(&8), None);

        let mut arrays: ChainMap<FixedBytes<[u8; 16]>, u32, SipHashBuilder> = ChainMap::new();
        let mut id = [0u8; 16];
        id[15] = 1;
        arrays.insert(&id, 1).unwrap();
        assert_eq!(arrays.get(&id), Some(&1));
        assert_eq!(arrays.get(&[0u8; 16]), None);
    }

    #[test]
    fn test_c_string_keys() {
        let mut map: ChainMap<CStrKey, i32, SipHashBuilder> = ChainMap::new();
        let name = std::ffi::CString::new("window.title").unwrap();
        let handle = map.insert(&name, 1).unwrap();
        drop(name);

        assert_eq!(map.get(c"window.title"), Some(&1));
        assert_eq!(
            map.key_at(handle).map(|k| k.to_bytes()),
            Some(&b"window.title"[..])
        );

        map.insert_or_replace(c"window.title", 2).unwrap();
        assert_eq!(map.get(c"window.title"), Some(&2));
        assert!(map.remove(c"window.title"));
        assert!(map.get(c"window.title").is_none());
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_matches_std_model() {
        let mut rng = SmallRng::seed_from_u64(0x5EED);
        let mut map: ChainMap<FixedBytes<u32>, u32, SipHashBuilder> = ChainMap::new();
        let mut model: std::collections::HashMap<u32, (u32, Handle)> =
            std::collections::HashMap::new();

        for step in 0..20_000u32 {
            let key = rng.random_range(0..512u32);
            match rng.random_range(0..4u8) {
                0 | 1 => match map.insert(&key, step) {
                    Ok(handle) => {
                        assert!(model.insert(key, (step, handle)).is_none());
                    }
                    Err(Error::DuplicateKey { handle }) => {
                        assert_eq!(model[&key].1, handle);
                    }
                    Err(err) => panic!("{err}"),
                },
                2 => {
                    assert_eq!(map.remove(&key), model.remove(&key).is_some());
                }
                _ => {
                    let handle = map.insert_or_replace(&key, step).unwrap();
                    let entry = model.entry(key).or_insert((step, handle));
                    entry.0 = step;
                    assert_eq!(entry.1, handle);
                }
            }
            assert_eq!(map.len(), model.len());
        }

        for (key, (value, handle)) in &model {
            assert_eq!(map.get(key), Some(value));
            assert_eq!(map.key_at(*handle), Some(key));
            assert_eq!(map.value_at(*handle).as_deref(), Some(value));
        }
        assert_eq!(map.iter().count(), model.len());
    }

    #[cfg(feature = "stats")]
    #[test]
    fn test_stats() {
        let mut map: StrMap<i32> = ChainMap::new();
        for i in 0..100 {
            map.insert(&format!("key_{i}"), i).unwrap();
        }
        map.remove("key_0");

        let stats = map.stats();
        assert_eq!(stats.len, 99);
        assert_eq!(stats.free, 1);
        assert_eq!(stats.histogram.iter().sum::<usize>(), stats.buckets);
        assert!(stats.average_chain_depth <= 3.0);
    }
}
