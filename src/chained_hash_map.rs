//! ChainedHashMap: separate chaining over a power-of-two bucket array.

use crate::config::{ConfigError, TableConfig};
use crate::fnv;
use crate::key::CanonicalKey;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use log::debug;
use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Debug)]
struct Entry<V> {
    key: Box<str>,
    hash: u32,
    value: V,
}

type Bucket<V> = Vec<Entry<V>>;

/// Failure to grow the bucket array. The table's contents are unchanged when
/// this is returned.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("bucket array cannot grow past {capacity} buckets")]
    CapacityOverflow { capacity: usize },
    #[error("failed to allocate storage for {buckets} buckets")]
    AllocationFailed {
        buckets: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Hash table with separate chaining, keyed by the canonical string form of
/// `K`.
///
/// Every entry caches the FNV-1a hash of its key; lookups compare the cached
/// hash before the key text, and growth relocates entries by cached hash
/// without rehashing the key.
///
/// For string keys declare the table as `ChainedHashMap<str, V>`; every
/// operation then accepts `&str` as well as `&String` arguments.
///
/// The table is not internally synchronized. Mutation requires `&mut self`;
/// callers sharing a table across threads must wrap it in a lock.
pub struct ChainedHashMap<K: ?Sized, V> {
    buckets: Vec<Bucket<V>>,
    len: usize,
    load_factor: f64,
    _key: PhantomData<fn(&K)>,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: ?Sized + CanonicalKey,
{
    /// Empty table with the default capacity and load factor threshold.
    pub fn new() -> Self {
        Self::from_valid_config(TableConfig::default())
    }

    /// Empty table with at least `capacity` buckets. Zero selects the default.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_valid_config(TableConfig::new().with_initial_capacity(capacity))
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: TableConfig) -> Self {
        let capacity = config.bucket_count();
        let mut buckets = Vec::with_capacity(capacity);
        buckets.resize_with(capacity, Vec::new);
        Self {
            buckets,
            len: 0,
            load_factor: config.load_factor,
            _key: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets; always a power of two.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Current ratio of entries to buckets.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// Ratio at which the next new key triggers growth.
    pub fn load_factor_threshold(&self) -> f64 {
        self.load_factor
    }

    #[inline]
    fn bucket_index(&self, hash: u32) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    /// Bucket index for `hash` and the key's position in that bucket, if present.
    fn locate(&self, key: &str, hash: u32) -> (usize, Option<usize>) {
        let idx = self.bucket_index(hash);
        let pos = self.buckets[idx]
            .iter()
            .position(|e| e.hash == hash && *e.key == *key);
        (idx, pos)
    }

    /// Insert or overwrite. Returns the previous value for an existing key.
    ///
    /// Panics if the bucket array cannot grow; see [`try_put`](Self::try_put).
    pub fn put(&mut self, key: &K, value: V) -> Option<V> {
        match self.try_put(key, value) {
            Ok(prev) => prev,
            Err(err) => panic!("hash table growth failed: {err}"),
        }
    }

    /// Fallible [`put`](Self::put). Overwrites never grow the table; a new
    /// key grows it first when `(len + 1) / capacity` would reach the
    /// threshold, so `len / capacity` stays below the threshold afterward.
    ///
    /// On error the table holds the same entries as before and `value` is
    /// dropped.
    pub fn try_put(&mut self, key: &K, value: V) -> Result<Option<V>, TableError> {
        let key = key.canonical_key();
        let hash = fnv::hash_key(&key);
        let (mut idx, pos) = self.locate(&key, hash);
        if let Some(pos) = pos {
            let slot = &mut self.buckets[idx][pos].value;
            return Ok(Some(mem::replace(slot, value)));
        }

        let new_len = self.len + 1;
        if self.exceeds_threshold(new_len, self.capacity()) {
            self.grow_for(new_len)?;
            idx = self.bucket_index(hash);
        }

        let bucket = &mut self.buckets[idx];
        bucket
            .try_reserve(1)
            .map_err(|source| TableError::AllocationFailed {
                buckets: 1,
                source,
            })?;
        bucket.push(Entry {
            key: key.into_owned().into_boxed_str(),
            hash,
            value,
        });
        self.len = new_len;
        Ok(None)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let key = key.canonical_key();
        let hash = fnv::hash_key(&key);
        let (idx, pos) = self.locate(&key, hash);
        Some(&self.buckets[idx][pos?].value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let key = key.canonical_key();
        let hash = fnv::hash_key(&key);
        let (idx, pos) = self.locate(&key, hash);
        Some(&mut self.buckets[idx][pos?].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`, returning its value. Absent keys return `None` and leave
    /// the table untouched. The last entry of the bucket takes the removed
    /// entry's place.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let key = key.canonical_key();
        let hash = fnv::hash_key(&key);
        let (idx, pos) = self.locate(&key, hash);
        let entry = self.buckets[idx].swap_remove(pos?);
        self.len -= 1;
        Some(entry.value)
    }

    /// Snapshot of every key and a reference to its value.
    pub fn entries(&self) -> hashbrown::HashMap<&str, &V> {
        let mut out = hashbrown::HashMap::with_capacity(self.len);
        out.extend(self.iter());
        out
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            it: self.buckets.iter().flatten(),
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            it: self.buckets.iter_mut().flatten(),
            remaining: self.len,
        }
    }

    fn exceeds_threshold(&self, len: usize, capacity: usize) -> bool {
        len as f64 / capacity as f64 >= self.load_factor
    }

    /// Double the capacity until `len` entries sit below the threshold, then
    /// rehash once into the final size.
    fn grow_for(&mut self, len: usize) -> Result<(), TableError> {
        let old_capacity = self.capacity();
        let mut new_capacity = old_capacity;
        while self.exceeds_threshold(len, new_capacity) {
            new_capacity = new_capacity
                .checked_mul(2)
                .ok_or(TableError::CapacityOverflow {
                    capacity: new_capacity,
                })?;
        }
        debug!(
            "growing bucket array from {} to {} buckets ({} entries)",
            old_capacity, new_capacity, self.len
        );
        self.rehash(new_capacity)
    }

    /// Move every entry into a fresh array of `new_capacity` buckets, placed
    /// by cached hash.
    ///
    /// All allocation happens before the first entry moves, and each new
    /// bucket is reserved to its exact final length, so the move loop cannot
    /// fail halfway.
    fn rehash(&mut self, new_capacity: usize) -> Result<(), TableError> {
        debug_assert!(new_capacity.is_power_of_two());
        let mask = new_capacity - 1;
        let alloc_failed = |source| TableError::AllocationFailed {
            buckets: new_capacity,
            source,
        };

        let mut sizes: Vec<usize> = Vec::new();
        sizes.try_reserve_exact(new_capacity).map_err(alloc_failed)?;
        sizes.resize(new_capacity, 0);
        for e in self.buckets.iter().flatten() {
            sizes[e.hash as usize & mask] += 1;
        }

        let mut buckets: Vec<Bucket<V>> = Vec::new();
        buckets.try_reserve_exact(new_capacity).map_err(alloc_failed)?;
        for &n in &sizes {
            let mut bucket = Vec::new();
            bucket.try_reserve_exact(n).map_err(alloc_failed)?;
            buckets.push(bucket);
        }

        for entry in mem::take(&mut self.buckets).into_iter().flatten() {
            let bucket = &mut buckets[entry.hash as usize & mask];
            debug_assert!(bucket.len() < bucket.capacity());
            bucket.push(entry);
        }
        self.buckets = buckets;
        Ok(())
    }

    /// Panics if any structural invariant is broken.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let cap = self.capacity();
        assert!(cap.is_power_of_two(), "capacity {cap} not a power of two");
        let mut seen = std::collections::HashSet::new();
        let mut count = 0;
        for (idx, bucket) in self.buckets.iter().enumerate() {
            for e in bucket {
                assert_eq!(e.hash, fnv::hash_key(&e.key), "stale cached hash");
                assert_eq!(e.hash as usize & (cap - 1), idx, "entry in wrong bucket");
                assert!(seen.insert(&*e.key), "duplicate key {:?}", e.key);
                count += 1;
            }
        }
        assert_eq!(count, self.len, "len out of sync");
        assert!(
            self.load_factor() < self.load_factor,
            "load factor {} not below threshold {}",
            self.load_factor(),
            self.load_factor
        );
    }

    #[cfg(test)]
    pub(crate) fn bucket_lengths(&self) -> Vec<usize> {
        self.buckets.iter().map(Vec::len).collect()
    }
}

impl<K, V> Default for ChainedHashMap<K, V>
where
    K: ?Sized + CanonicalKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ?Sized, V: fmt::Debug> fmt::Debug for ChainedHashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.buckets.iter().flatten().map(|e| (&e.key, &e.value)))
            .finish()
    }
}

/// Iterator over `(key, &value)` pairs in unspecified order.
pub struct Iter<'a, V> {
    it: core::iter::Flatten<core::slice::Iter<'a, Bucket<V>>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.it.next()?;
        self.remaining -= 1;
        Some((&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// Iterator over `(key, &mut value)` pairs in unspecified order.
pub struct IterMut<'a, V> {
    it: core::iter::Flatten<core::slice::IterMut<'a, Bucket<V>>>,
    remaining: usize,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (&'a str, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.it.next()?;
        self.remaining -= 1;
        Some((&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}

/// Owning iterator over `(key, value)` pairs in unspecified order.
pub struct IntoIter<V> {
    it: core::iter::Flatten<std::vec::IntoIter<Bucket<V>>>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = (String, V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.it.next()?;
        self.remaining -= 1;
        Some((e.key.into_string(), e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<K: ?Sized, V> IntoIterator for ChainedHashMap<K, V> {
    type Item = (String, V);
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> IntoIter<V> {
        IntoIter {
            remaining: self.len,
            it: self.buckets.into_iter().flatten(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a ChainedHashMap<K, V>
where
    K: ?Sized + CanonicalKey,
{
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}
