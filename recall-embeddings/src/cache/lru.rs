//! Slab-backed LRU index.
//!
//! Entries live in a slab; a doubly linked list threaded through the slab
//! orders them by recency, and a hash map finds a slot by key. Touch, insert,
//! remove, and evicting the least recent entry are all O(1).

use std::collections::HashMap;

#[derive(Debug)]
struct Slot<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct LruIndex<V> {
    slots: Vec<Option<Slot<V>>>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used.
    tail: Option<usize>,
}

impl<V> Default for LruIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LruIndex<V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Look up without changing recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.slot(idx).map(|s| &s.value)
    }

    /// Mutable lookup without changing recency.
    pub fn peek_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_mut().map(|s| &mut s.value)
    }

    /// Mark `key` most recently used. Returns false if absent.
    pub fn touch(&mut self, key: &str) -> bool {
        match self.index.get(key) {
            Some(&idx) => {
                self.unlink(idx);
                self.push_front(idx);
                true
            }
            None => false,
        }
    }

    /// Insert as most recently used. An existing value is replaced and returned.
    pub fn insert(&mut self, key: String, value: V) -> Option<V> {
        if let Some(&idx) = self.index.get(&key) {
            self.unlink(idx);
            self.push_front(idx);
            return self.slots[idx]
                .as_mut()
                .map(|s| std::mem::replace(&mut s.value, value));
        }

        let slot = Slot {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.push_front(idx);
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        self.release(idx).map(|(_, v)| v)
    }

    /// Remove and return the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(String, V)> {
        let idx = self.tail?;
        self.unlink(idx);
        let (key, value) = self.release(idx)?;
        self.index.remove(&key);
        Some((key, value))
    }

    /// Key of the least recently used entry.
    #[cfg(test)]
    pub fn peek_lru(&self) -> Option<&str> {
        self.tail
            .and_then(|idx| self.slot(idx))
            .map(|s| s.key.as_str())
    }

    /// Keys from most to least recently used.
    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let slot = self.slot(cursor?)?;
            cursor = slot.next;
            Some(slot.key.as_str())
        })
    }

    fn slot(&self, idx: usize) -> Option<&Slot<V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn release(&mut self, idx: usize) -> Option<(String, V)> {
        let slot = self.slots.get_mut(idx)?.take()?;
        self.free.push(idx);
        Some((slot.key, slot.value))
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slot(idx) {
            Some(s) => (s.prev, s.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(s) = self.slots[p].as_mut() {
                    s.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(s) = self.slots[n].as_mut() {
                    s.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(s) = self.slots[idx].as_mut() {
            s.prev = None;
            s.next = None;
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(s) = self.slots[idx].as_mut() {
            s.prev = None;
            s.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(s) = self.slots[h].as_mut() {
                s.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}
