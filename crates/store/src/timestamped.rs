//! Session caches that remember when they were last written.
//!
//! Each cache owns one `tokio::sync::Mutex` covering the whole collection
//! (not one per key). The lock is held only for the in-memory read or write
//! and never across a remote call.
//!
//! Rules shared by every cache here:
//! - a cache starts [`Hydration::NotLoaded`]; "loaded but empty" is a
//!   different state,
//! - `save` merges into the collection and hydrates a cold cache,
//! - `remove` only subtracts from a loaded collection,
//! - an empty batch is a no-op and leaves the timestamp alone.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// Whether a cache has ever been populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hydration<T> {
    NotLoaded,
    Loaded { value: T, updated_at: DateTime<Utc> },
}

impl<T> Hydration<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded { value, .. } => Some(value),
        }
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded { updated_at, .. } => Some(*updated_at),
        }
    }
}

impl<T> Default for Hydration<T> {
    fn default() -> Self {
        Self::NotLoaded
    }
}

/// Result of looking up one key in a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// The cache was never hydrated; the caller has to ask the remote.
    NotLoaded,
    Found(V),
    Missing,
}

/// Replace-all cache for a single value, e.g. the last good "up next" list.
#[derive(Debug)]
pub struct TimestampedSnapshot<T> {
    inner: Mutex<Hydration<T>>,
}

impl<T: Clone> TimestampedSnapshot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Hydration::NotLoaded),
        }
    }

    pub async fn get(&self) -> Option<T> {
        self.inner.lock().await.value().cloned()
    }

    pub async fn set(&self, value: T, at: DateTime<Utc>) {
        *self.inner.lock().await = Hydration::Loaded {
            value,
            updated_at: at,
        };
    }

    pub async fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().await.updated_at()
    }

    pub async fn clear(&self) {
        *self.inner.lock().await = Hydration::NotLoaded;
    }
}

impl<T: Clone> Default for TimestampedSnapshot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Set of keys plus the time of the last write.
#[derive(Debug)]
pub struct TimestampedSet<K> {
    inner: Mutex<Hydration<HashSet<K>>>,
}

impl<K> TimestampedSet<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Hydration::NotLoaded),
        }
    }

    /// Copy of the whole set, `None` if never hydrated.
    pub async fn get(&self) -> Option<HashSet<K>> {
        self.inner.lock().await.value().cloned()
    }

    pub async fn lookup(&self, key: &K) -> Lookup<K> {
        match &*self.inner.lock().await {
            Hydration::NotLoaded => Lookup::NotLoaded,
            Hydration::Loaded { value, .. } => match value.get(key) {
                Some(k) => Lookup::Found(k.clone()),
                None => Lookup::Missing,
            },
        }
    }

    /// Replaces the whole collection, including with an empty one.
    pub async fn set(&self, value: HashSet<K>, at: DateTime<Utc>) {
        *self.inner.lock().await = Hydration::Loaded {
            value,
            updated_at: at,
        };
    }

    /// Unions `keys` into the set. Hydrates a cold cache.
    pub async fn save(&self, keys: impl IntoIterator<Item = K>, at: DateTime<Utc>) {
        let mut keys = keys.into_iter().peekable();
        if keys.peek().is_none() {
            return;
        }
        let mut guard = self.inner.lock().await;
        match &mut *guard {
            Hydration::NotLoaded => {
                *guard = Hydration::Loaded {
                    value: keys.collect(),
                    updated_at: at,
                };
            }
            Hydration::Loaded { value, updated_at } => {
                value.extend(keys);
                *updated_at = at;
            }
        }
    }

    /// Unions `keys` into the set only if it is already hydrated.
    /// Returns whether the write happened.
    pub async fn merge_loaded(
        &self,
        keys: impl IntoIterator<Item = K>,
        at: DateTime<Utc>,
    ) -> bool {
        let mut keys = keys.into_iter().peekable();
        if keys.peek().is_none() {
            return false;
        }
        match &mut *self.inner.lock().await {
            Hydration::NotLoaded => false,
            Hydration::Loaded { value, updated_at } => {
                value.extend(keys);
                *updated_at = at;
                true
            }
        }
    }

    /// Subtracts `keys` from a hydrated set. Returns whether the write happened.
    pub async fn remove(&self, keys: impl IntoIterator<Item = K>, at: DateTime<Utc>) -> bool {
        let mut keys = keys.into_iter().peekable();
        if keys.peek().is_none() {
            return false;
        }
        match &mut *self.inner.lock().await {
            Hydration::NotLoaded => false,
            Hydration::Loaded { value, updated_at } => {
                for key in keys {
                    value.remove(&key);
                }
                *updated_at = at;
                true
            }
        }
    }

    pub async fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().await.updated_at()
    }

    pub async fn clear(&self) {
        *self.inner.lock().await = Hydration::NotLoaded;
    }
}

impl<K: Eq + Hash + Clone> Default for TimestampedSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyed collection plus the time of the last write.
#[derive(Debug)]
pub struct TimestampedMap<K, V> {
    inner: Mutex<Hydration<HashMap<K, V>>>,
}

impl<K, V> TimestampedMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Hydration::NotLoaded),
        }
    }

    /// Copy of the whole map, `None` if never hydrated.
    pub async fn get(&self) -> Option<HashMap<K, V>> {
        self.inner.lock().await.value().cloned()
    }

    pub async fn lookup(&self, key: &K) -> Lookup<V> {
        match &*self.inner.lock().await {
            Hydration::NotLoaded => Lookup::NotLoaded,
            Hydration::Loaded { value, .. } => match value.get(key) {
                Some(v) => Lookup::Found(v.clone()),
                None => Lookup::Missing,
            },
        }
    }

    /// Replaces the whole collection, including with an empty one.
    pub async fn set(&self, value: HashMap<K, V>, at: DateTime<Utc>) {
        *self.inner.lock().await = Hydration::Loaded {
            value,
            updated_at: at,
        };
    }

    /// Inserts `entries`, replacing values whose key is already present and
    /// keeping every other entry. Hydrates a cold cache.
    pub async fn save(&self, entries: impl IntoIterator<Item = (K, V)>, at: DateTime<Utc>) {
        let mut entries = entries.into_iter().peekable();
        if entries.peek().is_none() {
            return;
        }
        let mut guard = self.inner.lock().await;
        match &mut *guard {
            Hydration::NotLoaded => {
                *guard = Hydration::Loaded {
                    value: entries.collect(),
                    updated_at: at,
                };
            }
            Hydration::Loaded { value, updated_at } => {
                value.extend(entries);
                *updated_at = at;
            }
        }
    }

    /// Same merge as [`save`](Self::save) but only into a hydrated map.
    /// Returns whether the write happened.
    pub async fn merge_loaded(
        &self,
        entries: impl IntoIterator<Item = (K, V)>,
        at: DateTime<Utc>,
    ) -> bool {
        let mut entries = entries.into_iter().peekable();
        if entries.peek().is_none() {
            return false;
        }
        match &mut *self.inner.lock().await {
            Hydration::NotLoaded => false,
            Hydration::Loaded { value, updated_at } => {
                value.extend(entries);
                *updated_at = at;
                true
            }
        }
    }

    /// Replaces the value under `key` with `update(previous)` in a single
    /// critical section. Only applies to a hydrated map.
    pub async fn update_loaded(
        &self,
        key: K,
        update: impl FnOnce(Option<&V>) -> V,
        at: DateTime<Utc>,
    ) -> Option<V> {
        match &mut *self.inner.lock().await {
            Hydration::NotLoaded => None,
            Hydration::Loaded { value, updated_at } => {
                let next = update(value.get(&key));
                value.insert(key, next.clone());
                *updated_at = at;
                Some(next)
            }
        }
    }

    /// Drops `keys` from a hydrated map. Returns whether the write happened.
    pub async fn remove(&self, keys: impl IntoIterator<Item = K>, at: DateTime<Utc>) -> bool {
        let mut keys = keys.into_iter().peekable();
        if keys.peek().is_none() {
            return false;
        }
        match &mut *self.inner.lock().await {
            Hydration::NotLoaded => false,
            Hydration::Loaded { value, updated_at } => {
                for key in keys {
                    value.remove(&key);
                }
                *updated_at = at;
                true
            }
        }
    }

    pub async fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().await.updated_at()
    }

    pub async fn clear(&self) {
        *self.inner.lock().await = Hydration::NotLoaded;
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for TimestampedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn new_cache_is_not_loaded() {
        let set: TimestampedSet<u64> = TimestampedSet::new();
        assert_eq!(set.get().await, None);
        assert_eq!(set.updated_at().await, None);
        assert_eq!(set.lookup(&1).await, Lookup::NotLoaded);
    }

    #[tokio::test]
    async fn loaded_but_empty_differs_from_never_loaded() {
        let set: TimestampedSet<u64> = TimestampedSet::new();
        set.set(HashSet::new(), at(1)).await;
        assert_eq!(set.get().await, Some(HashSet::new()));
        assert_eq!(set.updated_at().await, Some(at(1)));
        assert_eq!(set.lookup(&1).await, Lookup::Missing);
    }

    #[tokio::test]
    async fn empty_save_keeps_timestamp() {
        let set: TimestampedSet<u64> = TimestampedSet::new();
        set.save([1, 2], at(1)).await;
        set.save(Vec::new(), at(5)).await;
        assert_eq!(set.updated_at().await, Some(at(1)));

        let cold: TimestampedSet<u64> = TimestampedSet::new();
        cold.save(Vec::new(), at(5)).await;
        assert_eq!(cold.updated_at().await, None, "empty batch must not hydrate");
    }

    #[tokio::test]
    async fn set_save_is_a_union() {
        let set = TimestampedSet::new();
        set.save([1_u64, 2], at(1)).await;
        set.save([2, 3], at(2)).await;
        let got = set.get().await.unwrap();
        assert_eq!(got, HashSet::from([1, 2, 3]));
        assert_eq!(set.updated_at().await, Some(at(2)));
    }

    #[tokio::test]
    async fn remove_on_cold_cache_is_noop() {
        let set: TimestampedSet<u64> = TimestampedSet::new();
        assert!(!set.remove([1], at(1)).await);
        assert_eq!(set.get().await, None);
        assert_eq!(set.updated_at().await, None);
    }

    #[tokio::test]
    async fn remove_subtracts_and_stamps() {
        let map = TimestampedMap::new();
        map.save([(1_u64, "a"), (2, "b")], at(1)).await;
        assert!(map.remove([1], at(3)).await);
        assert_eq!(map.lookup(&1).await, Lookup::Missing);
        assert_eq!(map.lookup(&2).await, Lookup::Found("b"));
        assert_eq!(map.updated_at().await, Some(at(3)));
    }

    #[tokio::test]
    async fn map_save_replaces_matching_keys_and_keeps_others() {
        let map = TimestampedMap::new();
        map.save([(1_u64, "a1"), (2, "b1")], at(1)).await;
        map.save([(2, "b2"), (3, "c1")], at(2)).await;
        let got = map.get().await.unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(got[&1], "a1");
        assert_eq!(got[&2], "b2");
        assert_eq!(got[&3], "c1");
    }

    #[tokio::test]
    async fn merge_loaded_skips_cold_cache() {
        let map: TimestampedMap<u64, &str> = TimestampedMap::new();
        assert!(!map.merge_loaded([(1, "a")], at(1)).await);
        assert_eq!(map.get().await, None);

        map.set(HashMap::new(), at(1)).await;
        assert!(map.merge_loaded([(1, "a")], at(2)).await);
        assert_eq!(map.lookup(&1).await, Lookup::Found("a"));
    }

    #[tokio::test]
    async fn update_loaded_sees_previous_value() {
        let map: TimestampedMap<u64, u32> = TimestampedMap::new();
        assert_eq!(map.update_loaded(1, |p| p.map_or(1, |v| v + 1), at(1)).await, None);

        map.save([(1, 4)], at(1)).await;
        let next = map.update_loaded(1, |p| p.map_or(1, |v| v + 1), at(2)).await;
        assert_eq!(next, Some(5));
        let fresh = map.update_loaded(2, |p| p.map_or(1, |v| v + 1), at(3)).await;
        assert_eq!(fresh, Some(1));
        assert_eq!(map.updated_at().await, Some(at(3)));
    }

    #[tokio::test]
    async fn clear_returns_to_not_loaded() {
        let map = TimestampedMap::new();
        map.save([(1_u64, 1_u32)], at(1)).await;
        map.clear().await;
        assert_eq!(map.get().await, None);
        assert_eq!(map.updated_at().await, None);
    }

    #[tokio::test]
    async fn snapshot_replaces_whole_value() {
        let snap = TimestampedSnapshot::new();
        assert_eq!(snap.get().await, None::<Vec<u32>>);
        snap.set(vec![1, 2, 3], at(1)).await;
        snap.set(vec![4], at(2)).await;
        assert_eq!(snap.get().await, Some(vec![4]));
        assert_eq!(snap.updated_at().await, Some(at(2)));
    }
}
