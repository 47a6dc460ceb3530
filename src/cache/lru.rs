//! Byte-budgeted LRU Store
//!
//! Recency-ordered key/value store with O(1) average get/put and
//! deterministic least-recently-used eviction.
//!
//! # Design
//!
//! - Entries live in a dense `Vec` arena linked by `prev`/`next` indices
//!   (head = most recent, tail = least recent)
//! - Removal uses `swap_remove` and re-points the moved entry's neighbours,
//!   so the arena never holds holes
//! - Budget is measured as `key.len() + value.byte_len()` per entry
//! - `max_bytes <= 0` disables eviction entirely

use std::collections::HashMap;

use bytes::Bytes;

/// Values stored in an [`LruCache`] report their size in bytes
pub trait ByteLen {
    fn byte_len(&self) -> usize;
}

impl ByteLen for String {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteLen for Vec<u8> {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteLen for Bytes {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

/// Callback invoked with each evicted entry
pub type OnEvicted<V> = Box<dyn FnMut(&str, &V) + Send>;

struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// LRU cache bounded by a byte budget. Not safe for concurrent use; see
/// [`super::store::GuardedCache`].
pub struct LruCache<V> {
    /// Byte budget (`<= 0` = unbounded)
    max_bytes: i64,
    /// Sum of entry sizes currently present
    current_bytes: i64,
    /// Entry arena
    nodes: Vec<Node<V>>,
    /// Key -> arena slot
    index: HashMap<String, usize>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used
    tail: Option<usize>,
    on_evicted: Option<OnEvicted<V>>,
}

#[inline]
fn entry_size<V: ByteLen>(key: &str, value: &V) -> i64 {
    (key.len() + value.byte_len()) as i64
}

impl<V: ByteLen> LruCache<V> {
    /// Create a cache with the given byte budget and optional eviction hook
    pub fn new(max_bytes: i64, on_evicted: Option<OnEvicted<V>>) -> Self {
        Self {
            max_bytes,
            current_bytes: 0,
            nodes: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            on_evicted,
        }
    }

    /// Look up a key, marking it most recently used on a hit
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        Some(&self.nodes[idx].value)
    }

    /// Check for a key without touching recency
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or update a key, then evict from the tail until within budget
    pub fn put(&mut self, key: &str, value: V) {
        if let Some(&idx) = self.index.get(key) {
            self.move_to_front(idx);
            let node = &mut self.nodes[idx];
            self.current_bytes += value.byte_len() as i64 - node.value.byte_len() as i64;
            node.value = value;
        } else {
            self.current_bytes += entry_size(key, &value);
            let idx = self.nodes.len();
            self.nodes.push(Node {
                key: key.to_owned(),
                value,
                prev: None,
                next: None,
            });
            self.index.insert(key.to_owned(), idx);
            self.push_front(idx);
        }

        // The entry just written sits at the head; it survives even when it
        // alone exceeds the budget.
        while self.max_bytes > 0 && self.current_bytes > self.max_bytes && self.nodes.len() > 1 {
            self.remove_oldest();
        }
    }

    /// Evict the least recently used entry
    pub fn remove_oldest(&mut self) -> Option<(String, V)> {
        let idx = self.tail?;
        let node = self.remove_at(idx);
        self.current_bytes -= entry_size(&node.key, &node.value);
        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&node.key, &node.value);
        }
        Some((node.key, node.value))
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no entries are stored
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bytes currently accounted
    pub fn bytes(&self) -> i64 {
        self.current_bytes
    }

    /// Configured byte budget
    pub fn max_bytes(&self) -> i64 {
        self.max_bytes
    }

    /// Entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        if let Some(head) = self.head {
            self.nodes[head].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn remove_at(&mut self, idx: usize) -> Node<V> {
        self.unlink(idx);
        let node = self.nodes.swap_remove(idx);
        self.index.remove(&node.key);

        if idx < self.nodes.len() {
            // the former last slot now lives at `idx`
            let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
            match prev {
                Some(p) => self.nodes[p].next = Some(idx),
                None => self.head = Some(idx),
            }
            match next {
                Some(n) => self.nodes[n].prev = Some(idx),
                None => self.tail = Some(idx),
            }
            if let Some(slot) = self.index.get_mut(&self.nodes[idx].key) {
                *slot = idx;
            }
        }

        node
    }
}

/// Iterator over `(key, value)` from most to least recently used
pub struct Iter<'a, V> {
    nodes: &'a [Node<V>],
    cursor: Option<usize>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes: &'a [Node<V>] = self.nodes;
        let node = &nodes[self.cursor?];
        self.cursor = node.next;
        Some((node.key.as_str(), &node.value))
    }
}

// =============================================================================
// Tests
// =============================================================================
