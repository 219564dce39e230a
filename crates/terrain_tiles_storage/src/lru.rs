use crate::SmallKeyBuildHasher;

use core::hash::{BuildHasher, Hash};
use std::collections::{hash_map, HashMap};

/// A map that remembers which key was Least Recently Used, so a bounded cache knows what to drop next.
///
/// Recency is updated by `insert` and `touch`; plain `get` leaves the order alone so it can be used for peeking.
///
/// Nothing is dropped implicitly. The owner decides when the map is too large and calls `pop_lru`.
#[derive(Clone, Debug)]
pub struct LruCache<K, V, H> {
    store: HashMap<K, (V, usize), H>,
    order: LruList<K>,
}

/// An `LruCache` using the aHash algorithm.
pub type SmallKeyLruCache<K, V> = LruCache<K, V, SmallKeyBuildHasher>;

impl<K, V, H> Default for LruCache<K, V, H>
where
    H: Default,
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V, H> LruCache<K, V, H>
where
    K: Hash + Eq,
{
    pub fn with_hasher(hasher_builder: H) -> LruCache<K, V, H> {
        LruCache {
            store: HashMap::with_hasher(hasher_builder),
            order: LruList::new(),
        }
    }
}

impl<K, V, H> LruCache<K, V, H>
where
    K: Hash + Eq + Clone,
    H: BuildHasher,
{
    /// Borrow the value for `key` without updating the LRU order.
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.store.get(key).map(|(val, _)| val)
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.store.contains_key(key)
    }

    /// Inserts `new_val` for `key`, returning the old value if there was one. `key` becomes the most recently used.
    #[inline]
    pub fn insert(&mut self, key: K, new_val: V) -> Option<V> {
        let Self { store, order } = self;
        match store.entry(key.clone()) {
            hash_map::Entry::Occupied(occupied) => {
                let (old_val, i) = occupied.into_mut();
                order.move_to_front(*i);

                Some(std::mem::replace(old_val, new_val))
            }
            hash_map::Entry::Vacant(vacant) => {
                let new_i = order.push_front(key);
                vacant.insert((new_val, new_i));

                None
            }
        }
    }

    /// Marks `key` as most recently used. Returns `false` iff there is no value for `key`.
    #[inline]
    pub fn touch(&mut self, key: &K) -> bool {
        let Self { store, order } = self;
        if let Some((_, i)) = store.get(key) {
            order.move_to_front(*i);

            true
        } else {
            false
        }
    }

    #[inline]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (val, i) = self.store.remove(key)?;
        self.order.remove(i);

        Some(val)
    }

    /// Removes the least recently used value. Nothing happens if the cache is empty.
    #[inline]
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let key = self.order.pop_back()?;
        let (val, _) = self.store.remove(&key)?;

        Some((key, val))
    }

    #[inline]
    pub fn clear(&mut self) {
        self.store.clear();
        self.order.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[inline]
    pub fn keys(&self) -> hash_map::Keys<'_, K, (V, usize)> {
        self.store.keys()
    }
}

/// Doubly-linked list using Vec as storage.
#[derive(Clone, Debug)]
struct LruList<T> {
    entries: Vec<ListEntry<T>>,
}

#[derive(Clone, Debug)]
struct ListEntry<T> {
    value: Option<T>,
    next: usize,
    prev: usize,
}

/// Free and occupied cells are each linked into a cyclic list with one auxiliary cell.
/// Cell #0 is on the list of free cells, cell #1 is on the list of occupied cells.
impl<T> LruList<T> {
    const FREE: usize = 0;
    const OCCUPIED: usize = 1;

    fn new() -> LruList<T> {
        let mut list = LruList {
            entries: Vec::with_capacity(2),
        };
        list.clear();

        list
    }

    fn unlink(&mut self, index: usize) {
        let prev = self.entries[index].prev;
        let next = self.entries[index].next;
        self.entries[prev].next = next;
        self.entries[next].prev = prev;
    }

    fn link_after(&mut self, index: usize, prev: usize) {
        let next = self.entries[prev].next;
        self.entries[index].prev = prev;
        self.entries[index].next = next;
        self.entries[prev].next = index;
        self.entries[next].prev = index;
    }

    fn move_to_front(&mut self, index: usize) {
        self.unlink(index);
        self.link_after(index, Self::OCCUPIED);
    }

    fn push_front(&mut self, value: T) -> usize {
        if self.entries[Self::FREE].next == Self::FREE {
            self.entries.push(ListEntry::<T> {
                value: None,
                next: Self::FREE,
                prev: Self::FREE,
            });
            self.entries[Self::FREE].next = self.entries.len() - 1;
        }
        let index = self.entries[Self::FREE].next;
        self.entries[index].value = Some(value);
        self.unlink(index);
        self.link_after(index, Self::OCCUPIED);

        index
    }

    fn remove(&mut self, index: usize) -> Option<T> {
        self.unlink(index);
        self.link_after(index, Self::FREE);

        self.entries[index].value.take()
    }

    fn pop_back(&mut self) -> Option<T> {
        let index = self.entries[Self::OCCUPIED].prev;
        if index == Self::OCCUPIED {
            return None;
        }

        self.remove(index)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.entries.push(ListEntry::<T> {
            value: None,
            next: Self::FREE,
            prev: Self::FREE,
        });
        self.entries.push(ListEntry::<T> {
            value: None,
            next: Self::OCCUPIED,
            prev: Self::OCCUPIED,
        });
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
