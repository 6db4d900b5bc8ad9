use std::collections::{BTreeMap, BTreeSet};

/// Index into a list, wrapping around either end. Negative indices count from the back.
pub fn wraparound_get<T>(vec: &[T], idx: isize) -> &T {
    let len = vec.len() as isize;
    let idx = idx % len;
    let idx = if idx >= 0 { idx } else { idx + len };
    &vec[idx as usize]
}

/// A map from a key to a set of values. Keys with no values are never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiMap<K, V> {
    map: BTreeMap<K, BTreeSet<V>>,
    empty: BTreeSet<V>,
}

impl<K, V> MultiMap<K, V>
where
    K: Ord + Clone,
    V: Ord + Clone,
{
    pub fn new() -> MultiMap<K, V> {
        MultiMap {
            map: BTreeMap::new(),
            empty: BTreeSet::new(),
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.map.entry(key).or_insert_with(BTreeSet::new).insert(value);
    }

    pub fn remove(&mut self, key: K, value: V) {
        if let Some(values) = self.map.get_mut(&key) {
            values.remove(&value);
            if values.is_empty() {
                self.map.remove(&key);
            }
        }
    }

    /// Removes the key and returns whatever values it had.
    pub fn remove_key(&mut self, key: &K) -> BTreeSet<V> {
        self.map.remove(key).unwrap_or_default()
    }

    pub fn get(&self, key: K) -> &BTreeSet<V> {
        self.map.get(&key).unwrap_or(&self.empty)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K, V> Default for MultiMap<K, V>
where
    K: Ord + Clone,
    V: Ord + Clone,
{
    fn default() -> MultiMap<K, V> {
        MultiMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraparound() {
        let list = vec!['a', 'b', 'c'];
        assert_eq!(*wraparound_get(&list, -1), 'c');
        assert_eq!(*wraparound_get(&list, 3), 'a');
        assert_eq!(*wraparound_get(&list, 4), 'b');
    }

    #[test]
    fn multimap_drops_empty_keys() {
        let mut mm: MultiMap<usize, &str> = MultiMap::new();
        mm.insert(1, "x");
        mm.insert(1, "y");
        mm.remove(1, "x");
        assert_eq!(mm.get(1).len(), 1);
        mm.remove(1, "y");
        assert!(!mm.contains_key(&1));
        assert!(mm.get(1).is_empty());
    }
}
