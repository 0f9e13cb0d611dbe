// SPDX-License-Identifier: MPL-2.0

//! A private module for tiny maps that avoids hashing overhead for the handful of packages
//! that typically appear together in a single incompatibility.

use std::fmt;

#[derive(Clone)]
pub(crate) enum SmallMap<K, V> {
    Empty,
    One([(K, V); 1]),
    Two([(K, V); 2]),
    Flexible(Vec<(K, V)>),
}

impl<K: PartialEq, V> SmallMap<K, V> {
    pub(crate) fn as_slice(&self) -> &[(K, V)] {
        match self {
            Self::Empty => &[],
            Self::One(v) => v,
            Self::Two(v) => v,
            Self::Flexible(v) => v,
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [(K, V)] {
        match self {
            Self::Empty => &mut [],
            Self::One(v) => v,
            Self::Two(v) => v,
            Self::Flexible(v) => v,
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        self.as_slice().iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.as_mut_slice()
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub(crate) fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub(crate) fn insert(&mut self, key: K, value: V) {
        if let Some(slot) = self.get_mut(&key) {
            *slot = value;
            return;
        }
        *self = match std::mem::replace(self, Self::Empty) {
            Self::Empty => Self::One([(key, value)]),
            Self::One([first]) => Self::Two([first, (key, value)]),
            Self::Two([a, b]) => Self::Flexible(vec![a, b, (key, value)]),
            Self::Flexible(mut v) => {
                v.push((key, value));
                Self::Flexible(v)
            }
        }
    }

    /// Insert `value` under `key`, combining it with any existing value via `combine` instead of
    /// overwriting it.
    pub(crate) fn merge(&mut self, key: K, value: V, combine: impl FnOnce(&V, &V) -> V) {
        if let Some(slot) = self.get_mut(&key) {
            *slot = combine(slot, &value);
        } else {
            self.insert(key, value);
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.as_slice().iter().map(|(k, v)| (k, v))
    }
}

impl<K, V> Default for SmallMap<K, V> {
    fn default() -> Self {
        Self::Empty
    }
}

impl<K: PartialEq + fmt::Debug, V: fmt::Debug> fmt::Debug for SmallMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_slice().fmt(f)
    }
}
