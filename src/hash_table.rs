use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::error::Error;
use crate::error::Storage;

/// Link value terminating a bucket chain or the free list.
const NIL: u32 = u32::MAX;

/// Lower bound for the first bucket table; rounded up to the next prime.
const INITIAL_BUCKETS: usize = 10;

/// Slot store capacity allocated on first insert.
const INITIAL_SLOTS: usize = 32;

/// Average chain depth (`len / buckets`, integer division) above which a new
/// key triggers a rehash.
const MAX_AVERAGE_CHAIN: usize = 2;

/// Factor applied to the bucket count before rounding to the next prime.
const BUCKET_GROWTH: usize = 4;

/// Slot indices must stay below `NIL`.
const MAX_SLOTS: usize = NIL as usize;

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }

    let mut divisor = 5usize;
    while divisor.saturating_mul(divisor) <= n {
        if n % divisor == 0 || n % (divisor + 2) == 0 {
            return false;
        }
        divisor += 6;
    }
    true
}

/// Smallest prime greater than or equal to `n`.
pub(crate) fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

/// A stable reference to one slot of a [`HashTable`].
///
/// The index stays the same while the entry lives, no matter how often the
/// slot store reallocates or the bucket table rehashes. The generation
/// changes whenever the slot is freed, so a handle kept past the removal of
/// its entry resolves to nothing, even after the slot has been reused for
/// another key.
///
/// Generations never wrap. A slot freed at generation `u32::MAX` is retired
/// instead of going back on the free list, and later inserts use other
/// slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// The slot index this handle points at.
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// The slot generation this handle was issued for.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Clone)]
struct Slot<T> {
    hash: u64,
    /// Next slot in the bucket chain while occupied, next free slot while
    /// vacant.
    link: u32,
    generation: u32,
    value: Option<T>,
}

/// Chain depth statistics for a [`HashTable`].
///
/// Only available with the `stats` feature.
#[cfg(feature = "stats")]
#[derive(Debug, Clone)]
pub struct ChainStats {
    /// Number of live entries.
    pub len: usize,
    /// Number of slots ever handed out (live, free and retired).
    pub limit: usize,
    /// Number of slots waiting on the free list.
    pub free: usize,
    /// Allocated slot store capacity.
    pub capacity: usize,
    /// Number of buckets (always prime once allocated).
    pub buckets: usize,
    /// Number of buckets with no chain.
    pub empty_buckets: usize,
    /// Depth of the longest chain.
    pub longest_chain: usize,
    /// Live entries per bucket.
    pub average_chain_depth: f64,
    /// `histogram[d]` is the number of buckets whose chain has depth `d`.
    pub histogram: Vec<usize>,
}

#[cfg(feature = "stats")]
impl ChainStats {
    /// Pretty-print the statistics and a chain depth histogram to stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Chain Statistics ===");
        println!(
            "Entries: {} live, {} free, {} handed out, {} allocated",
            self.len, self.free, self.limit, self.capacity
        );
        println!(
            "Buckets: {} ({} empty), average depth {:.2}, longest {}",
            self.buckets, self.empty_buckets, self.average_chain_depth, self.longest_chain
        );

        let max = self.histogram.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("depth histogram: empty");
            return;
        }

        let max_bar = 60usize;
        for (depth, &count) in self.histogram.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{:>3} | {} ({})", depth, "█".repeat(width), count);
        }
    }
}

/// A separately chained hash table over an index-addressed slot store.
///
/// `HashTable<T>` stores values of type `T`. Like other raw table APIs it does
/// not hash anything itself: every operation takes the hash of the value and
/// an equality predicate, and the hash is cached in the slot so rehashing
/// never calls back into the caller.
///
/// Slots are never moved between indices. Removed slots are threaded onto a
/// free list and handed out again before the slot store grows, and every
/// insert returns a [`Handle`] that stays valid until the entry is removed.
///
/// ## Example
///
/// ```rust
/// # use core::hash::BuildHasher;
/// # use std::collections::hash_map::RandomState;
/// #
/// # use slot_chain::hash_table::Entry;
/// # use slot_chain::hash_table::HashTable;
/// #
/// let state = RandomState::new();
/// let mut table = HashTable::new();
///
/// let hash = state.hash_one("alice");
/// let handle = match table.entry(hash, |name: &&str| *name == "alice") {
///     Entry::Vacant(entry) => entry.insert("alice").unwrap(),
///     Entry::Occupied(entry) => entry.handle(),
/// };
///
/// assert_eq!(table.get(handle), Some(&"alice"));
/// assert_eq!(table.find(hash, |name| *name == "alice"), Some(&"alice"));
/// ```
#[derive(Clone)]
pub struct HashTable<T> {
    buckets: Vec<u32>,
    slots: Vec<Slot<T>>,
    free_head: u32,
    free_count: usize,
    /// Slots whose generations ran out; they are never reused.
    retired: usize,
    next_generation: u32,
}

impl<T> Debug for HashTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("len", &self.len())
            .field("limit", &self.slots.len())
            .field("free", &self.free_count)
            .field("retired", &self.retired)
            .field("capacity", &self.slots.capacity())
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

impl<T> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HashTable<T> {
    /// Creates an empty table. Nothing is allocated until the first insert.
    pub const fn new() -> Self {
        Self {
            buckets: Vec::new(),
            slots: Vec::new(),
            free_head: NIL,
            free_count: 0,
            retired: 0,
            next_generation: 0,
        }
    }

    /// Creates a table that can hold `capacity` entries without growing the
    /// slot store or rehashing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use slot_chain::hash_table::HashTable;
    /// #
    /// let table: HashTable<u64> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// assert!(table.bucket_count() >= 34);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            return Self::new();
        }

        let capacity = capacity.clamp(INITIAL_SLOTS, MAX_SLOTS);
        let buckets = Self::buckets_for(capacity);
        Self {
            buckets: alloc::vec![NIL; buckets],
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// Bucket count that keeps `entries` entries under the rehash threshold.
    fn buckets_for(entries: usize) -> usize {
        next_prime(
            entries
                .div_ceil(MAX_AVERAGE_CHAIN + 1)
                .max(INITIAL_BUCKETS),
        )
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_count - self.retired
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the allocated slot store capacity.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the number of buckets, `0` before the first insert.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        debug_assert!(!self.buckets.is_empty());
        (hash % self.buckets.len() as u64) as usize
    }

    #[inline]
    fn handle(&self, index: u32) -> Handle {
        Handle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Walks the chain for `hash`, comparing cached hashes before calling
    /// `eq`.
    fn search(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<u32> {
        if self.buckets.is_empty() {
            return None;
        }

        let mut index = self.buckets[self.bucket_of(hash)];
        while index != NIL {
            let slot = &self.slots[index as usize];
            if slot.hash == hash && slot.value.as_ref().is_some_and(&eq) {
                return Some(index);
            }
            index = slot.link;
        }
        None
    }

    /// Returns a reference to the value matching `hash` and `eq`.
    pub fn find(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&T> {
        let index = self.search(hash, eq)?;
        self.slots[index as usize].value.as_ref()
    }

    /// Returns a mutable reference to the value matching `hash` and `eq`.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&mut T> {
        let index = self.search(hash, eq)?;
        self.slots[index as usize].value.as_mut()
    }

    /// Returns the handle of the value matching `hash` and `eq`.
    pub fn find_handle(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<Handle> {
        self.search(hash, eq).map(|index| self.handle(index))
    }

    /// Gets the entry for `hash` and `eq`.
    ///
    /// A vacant entry does not allocate; growth happens in
    /// [`VacantEntry::insert`].
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Entry<'_, T> {
        match self.search(hash, eq) {
            Some(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            None => Entry::Vacant(VacantEntry { table: self, hash }),
        }
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// The freed slot goes to the front of the free list and every handle to
    /// it becomes stale.
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<T> {
        if self.buckets.is_empty() {
            return None;
        }

        let bucket = self.bucket_of(hash);
        let mut prev = NIL;
        let mut index = self.buckets[bucket];
        while index != NIL {
            let slot = &self.slots[index as usize];
            let next = slot.link;
            if slot.hash == hash && slot.value.as_ref().is_some_and(&eq) {
                if prev == NIL {
                    self.buckets[bucket] = next;
                } else {
                    self.slots[prev as usize].link = next;
                }
                return self.release(index);
            }
            prev = index;
            index = next;
        }
        None
    }

    /// Returns a reference to the value behind `handle`, or `None` if the
    /// handle is out of range, free, or stale.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Returns a mutable reference to the value behind `handle`.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Removes the value behind `handle`.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<T> {
        self.get(handle)?;
        self.unlink(handle.index);
        self.release(handle.index)
    }

    /// Detaches an occupied slot from its bucket chain.
    fn unlink(&mut self, index: u32) {
        let bucket = self.bucket_of(self.slots[index as usize].hash);
        let next = self.slots[index as usize].link;

        if self.buckets[bucket] == index {
            self.buckets[bucket] = next;
            return;
        }

        let mut current = self.buckets[bucket];
        while current != NIL {
            let slot = &mut self.slots[current as usize];
            if slot.link == index {
                slot.link = next;
                return;
            }
            current = slot.link;
        }
        debug_assert!(false, "slot {index} missing from bucket {bucket}");
    }

    /// Pushes an already unlinked slot onto the free list, or retires it
    /// once its generation cannot advance any further.
    fn release(&mut self, index: u32) -> Option<T> {
        let slot = &mut self.slots[index as usize];
        let value = slot.value.take();
        if slot.generation == u32::MAX {
            log::debug!("retiring slot {index}: generations exhausted");
            slot.link = NIL;
            self.retired += 1;
            return value;
        }

        slot.generation += 1;
        slot.link = self.free_head;
        self.free_head = index;
        self.free_count += 1;
        value
    }

    /// Empties the table and hands back the old slot store.
    ///
    /// The generation base moves past every generation in use, so no handle
    /// issued so far resolves once the table is refilled.
    fn reset(&mut self) -> Vec<Slot<T>> {
        let slots = core::mem::take(&mut self.slots);
        let generation = slots
            .iter()
            .map(|slot| slot.generation.saturating_add(1))
            .max()
            .unwrap_or(0);
        self.next_generation = self.next_generation.max(generation);

        self.buckets = Vec::new();
        self.free_head = NIL;
        self.free_count = 0;
        self.retired = 0;
        slots
    }

    /// Removes every entry and frees both backing arrays.
    ///
    /// Handles issued before the call never resolve again, including once
    /// the table has been refilled.
    pub fn clear(&mut self) {
        drop(self.reset());
    }

    /// Makes room for `additional` more entries without further allocation
    /// or rehashing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use slot_chain::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32> = HashTable::new();
    /// table.try_reserve(500).unwrap();
    /// assert!(table.capacity() >= 500);
    /// ```
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), Error> {
        if additional == 0 {
            return Ok(());
        }

        let required = self.len().saturating_add(additional);
        let slots = self
            .slots
            .len()
            .saturating_add(additional.saturating_sub(self.free_count));
        if slots > MAX_SLOTS {
            return Err(Error::AllocFailed {
                storage: Storage::Slots,
                requested: slots,
            });
        }
        if slots > self.slots.capacity() {
            self.try_grow_slots(slots)?;
        }

        let buckets = Self::buckets_for(required);
        if buckets > self.buckets.len() {
            self.rehash(buckets)?;
        }
        Ok(())
    }

    /// Allocates or grows storage so one new entry can be linked in.
    fn reserve_for_insert(&mut self) -> Result<(), Error> {
        if self.buckets.is_empty() {
            log::trace!("allocating initial bucket table");
            self.rehash(next_prime(INITIAL_BUCKETS))?;
        }

        if self.free_head == NIL && self.slots.len() == self.slots.capacity() {
            self.grow_slots()?;
        }

        if self.len() / self.buckets.len() > MAX_AVERAGE_CHAIN {
            let buckets = next_prime(self.buckets.len().saturating_mul(BUCKET_GROWTH));
            self.rehash(buckets)?;
        }
        Ok(())
    }

    /// Doubles the slot store, falling back to 1.5x.
    #[cold]
    fn grow_slots(&mut self) -> Result<(), Error> {
        let capacity = self.slots.capacity();
        if capacity == 0 {
            return self.try_grow_slots(INITIAL_SLOTS);
        }

        match self.try_grow_slots(capacity.saturating_mul(2)) {
            Ok(()) => Ok(()),
            Err(err) => {
                log::warn!("{err}; retrying with 1.5x growth");
                self.try_grow_slots(capacity.saturating_add(capacity / 2))
            }
        }
    }

    fn try_grow_slots(&mut self, target: usize) -> Result<(), Error> {
        let target = target.min(MAX_SLOTS);
        let alloc_failed = Error::AllocFailed {
            storage: Storage::Slots,
            requested: target,
        };
        if target <= self.slots.len() {
            return Err(alloc_failed);
        }

        self.slots
            .try_reserve_exact(target - self.slots.len())
            .map_err(|_| alloc_failed)?;
        log::trace!("slot store grown to {} slots", self.slots.capacity());
        Ok(())
    }

    /// Relinks every occupied slot into a fresh array of `count` buckets.
    ///
    /// The old array stays in place until the new one is allocated, so a
    /// failure leaves the table untouched.
    #[cold]
    fn rehash(&mut self, count: usize) -> Result<(), Error> {
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(count)
            .map_err(|_| Error::AllocFailed {
                storage: Storage::Buckets,
                requested: count,
            })?;
        buckets.resize(count, NIL);

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.is_none() {
                continue;
            }
            let bucket = (slot.hash % count as u64) as usize;
            slot.link = buckets[bucket];
            buckets[bucket] = index as u32;
        }

        log::debug!(
            "rehashed {} entries from {} into {} buckets",
            self.len(),
            self.buckets.len(),
            count
        );
        self.buckets = buckets;
        Ok(())
    }

    /// Takes a slot off the free list, or appends one, and links it at the
    /// head of `bucket`. Storage must already have been reserved.
    fn link_new(&mut self, bucket: usize, hash: u64, value: T) -> u32 {
        let link = self.buckets[bucket];
        let index = if self.free_head != NIL {
            let index = self.free_head;
            let slot = &mut self.slots[index as usize];
            self.free_head = slot.link;
            self.free_count -= 1;

            slot.hash = hash;
            slot.link = link;
            slot.value = Some(value);
            index
        } else {
            debug_assert!(self.slots.len() < self.slots.capacity());
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                hash,
                link,
                generation: self.next_generation,
                value: Some(value),
            });
            index
        };

        self.buckets[bucket] = index;
        index
    }

    /// Returns an iterator over the live entries in slot order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: &self.slots,
            index: 0,
            remaining: self.len(),
        }
    }

    /// Returns an iterator that removes and yields every value.
    ///
    /// The table is emptied up front, exactly as by [`clear`](Self::clear);
    /// values the iterator does not yield are dropped with it.
    pub fn drain(&mut self) -> Drain<'_, T> {
        let remaining = self.len();
        Drain {
            slots: self.reset().into_iter(),
            remaining,
            _table: PhantomData,
        }
    }

    /// Returns chain depth statistics.
    ///
    /// Only available with the `stats` feature.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> ChainStats {
        let mut histogram = Vec::new();
        let mut empty_buckets = 0;

        for &head in &self.buckets {
            let mut depth = 0;
            let mut index = head;
            while index != NIL {
                depth += 1;
                index = self.slots[index as usize].link;
            }

            if depth == 0 {
                empty_buckets += 1;
            }
            if histogram.len() <= depth {
                histogram.resize(depth + 1, 0);
            }
            histogram[depth] += 1;
        }

        ChainStats {
            len: self.len(),
            limit: self.slots.len(),
            free: self.free_count,
            capacity: self.slots.capacity(),
            buckets: self.buckets.len(),
            empty_buckets,
            longest_chain: histogram.len().saturating_sub(1),
            average_chain_depth: if self.buckets.is_empty() {
                0.0
            } else {
                self.len() as f64 / self.buckets.len() as f64
            },
            histogram,
        }
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, T> {
    /// No value matched.
    Vacant(VacantEntry<'a, T>),
    /// A value matched.
    Occupied(OccupiedEntry<'a, T>),
}

impl<'a, T> Entry<'a, T> {
    /// Inserts `default` if the entry is vacant and returns the entry's
    /// handle.
    pub fn or_insert(self, default: T) -> Result<Handle, Error> {
        match self {
            Entry::Occupied(entry) => Ok(entry.handle()),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns the
    /// entry's handle.
    pub fn or_insert_with(self, default: impl FnOnce() -> T) -> Result<Handle, Error> {
        match self {
            Entry::Occupied(entry) => Ok(entry.handle()),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, T> {
    table: &'a mut HashTable<T>,
    hash: u64,
}

impl<'a, T> VacantEntry<'a, T> {
    /// Inserts `value` and returns its handle.
    ///
    /// This is where storage grows: the bucket table is allocated on first
    /// use, the slot store grows when no free slot is left, and the buckets
    /// are rehashed into roughly four times as many once the average chain
    /// holds more than two entries. If any allocation fails `value` is
    /// dropped and the table keeps its previous state.
    pub fn insert(self, value: T) -> Result<Handle, Error> {
        let table = self.table;
        table.reserve_for_insert()?;

        let bucket = table.bucket_of(self.hash);
        let index = table.link_new(bucket, self.hash, value);
        Ok(table.handle(index))
    }

    /// The hash this entry was looked up with.
    pub fn hash(&self) -> u64 {
        self.hash
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, T> {
    table: &'a mut HashTable<T>,
    index: u32,
}

impl<'a, T> OccupiedEntry<'a, T> {
    /// The handle of this entry.
    pub fn handle(&self) -> Handle {
        self.table.handle(self.index)
    }

    fn slot_value(&self) -> &T {
        match &self.table.slots[self.index as usize].value {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }

    fn slot_value_mut(&mut self) -> &mut T {
        match &mut self.table.slots[self.index as usize].value {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &T {
        self.slot_value()
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut T {
        self.slot_value_mut()
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut T {
        let table = self.table;
        match &mut table.slots[self.index as usize].value {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Replaces the value in place and returns the old one. The slot and its
    /// handle are unchanged.
    pub fn replace(&mut self, value: T) -> T {
        core::mem::replace(self.slot_value_mut(), value)
    }

    /// Removes the entry and returns its value.
    pub fn remove(self) -> T {
        self.table.unlink(self.index);
        match self.table.release(self.index) {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }
}

/// An iterator over the live entries of a [`HashTable`].
///
/// Yields each value with its [`Handle`], in slot order.
pub struct Iter<'a, T> {
    slots: &'a [Slot<T>],
    index: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.slots.len() {
            let index = self.index;
            self.index += 1;

            let slot = &self.slots[index];
            if let Some(value) = &slot.value {
                self.remaining -= 1;
                let handle = Handle {
                    index: index as u32,
                    generation: slot.generation,
                };
                return Some((handle, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// A draining iterator over the values of a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, T> {
    slots: alloc::vec::IntoIter<Slot<T>>,
    remaining: usize,
    _table: PhantomData<&'a mut HashTable<T>>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(value) = slot.value {
                self.remaining -= 1;
                return Some(value);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}

impl<T> FusedIterator for Drain<'_, T> {}
