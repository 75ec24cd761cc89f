//! Staged-commit storage primitives.
//!
//! A [`StagedMap`] keeps a committed table plus a pending overlay. Reads see
//! the overlay first; writes only touch the overlay. [`StagedMap::commit`]
//! folds the overlay into the committed table and [`StagedMap::rollback`]
//! drops it, leaving the committed table exactly as it was.

use std::collections::HashMap;
use std::hash::Hash;

/// A hash map with a pending write overlay.
#[derive(Clone, Debug)]
pub struct StagedMap<K, V> {
    committed: HashMap<K, V>,
    /// `Some` is a staged insert or update, `None` a staged removal.
    pending: HashMap<K, Option<V>>,
}

impl<K, V> Default for StagedMap<K, V> {
    fn default() -> Self {
        Self {
            committed: HashMap::new(),
            pending: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> StagedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, pending writes first.
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.pending.get(key) {
            Some(staged) => staged.as_ref(),
            None => self.committed.get(key),
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Mutable access to `key`. The committed value is copied into the
    /// overlay on first write.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.stage(key);
        self.pending.get_mut(key).and_then(Option::as_mut)
    }

    /// Mutable access to `key`, inserting `f()` if it is absent.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, f: F) -> &mut V {
        self.stage(&key);
        self.pending.entry(key).or_insert(None).get_or_insert_with(f)
    }

    /// Stage an insert, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let old = self.get(&key).cloned();
        self.pending.insert(key, Some(value));
        old
    }

    /// Stage a removal, returning the removed value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let old = self.get(key).cloned();
        if old.is_some() {
            self.pending.insert(key.clone(), None);
        }
        old
    }

    /// Number of live entries, pending writes included.
    pub fn len(&self) -> usize {
        let mut len = self.committed.len();
        for (key, staged) in &self.pending {
            match (self.committed.contains_key(key), staged.is_some()) {
                (false, true) => len += 1,
                (true, false) => len -= 1,
                _ => {}
            }
        }
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any write is staged.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Fold the overlay into the committed table.
    pub fn commit(&mut self) {
        for (key, staged) in self.pending.drain() {
            match staged {
                Some(value) => {
                    self.committed.insert(key, value);
                }
                None => {
                    self.committed.remove(&key);
                }
            }
        }
    }

    /// Discard the overlay.
    pub fn rollback(&mut self) {
        self.pending.clear();
    }

    fn stage(&mut self, key: &K) {
        if !self.pending.contains_key(key) {
            if let Some(value) = self.committed.get(key) {
                self.pending.insert(key.clone(), Some(value.clone()));
            }
        }
    }
}

/// A single value with a pending write slot.
#[derive(Clone, Debug, Default)]
pub struct StagedValue<T> {
    committed: T,
    pending: Option<T>,
}

impl<T: Clone> StagedValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            committed: value,
            pending: None,
        }
    }

    pub fn get(&self) -> &T {
        self.pending.as_ref().unwrap_or(&self.committed)
    }

    pub fn get_mut(&mut self) -> &mut T {
        let committed = &self.committed;
        self.pending.get_or_insert_with(|| committed.clone())
    }

    pub fn set(&mut self, value: T) -> T {
        let old = self.get().clone();
        self.pending = Some(value);
        old
    }

    pub fn commit(&mut self) {
        if let Some(value) = self.pending.take() {
            self.committed = value;
        }
    }

    pub fn rollback(&mut self) {
        self.pending = None;
    }
}
