//! Owned record storage with a session-scoped free list.
//!
//! A single contiguous allocation holds `key ‖ value` back to back, with
//! `key_len` marking the split point. Storage is drawn from a free list
//! scoped to one `Sorter`/`Iterator` pair rather than shared process-wide, so
//! recycled buffers never outlive the session that allocated them.

/// One buffered record: `key` followed by `value` in a single `Vec<u8>`.
#[derive(Debug, Clone)]
pub struct Entry {
    data: Vec<u8>,
    key_len: usize,
}

impl Entry {
    pub fn key(&self) -> &[u8] {
        &self.data[..self.key_len]
    }

    pub fn value(&self) -> &[u8] {
        &self.data[self.key_len..]
    }
}

/// Free list of recycled `Vec<u8>` backing storage, scoped to one session.
#[derive(Default)]
pub struct EntryPool {
    free: Vec<Vec<u8>>,
}

impl EntryPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an `Entry` from `key`/`value`, reusing a pooled allocation when
    /// one of sufficient capacity is available.
    pub fn fetch(&mut self, key: &[u8], value: &[u8]) -> Entry {
        let needed = key.len() + value.len();
        let mut data = match self.free.iter().position(|v| v.capacity() >= needed) {
            Some(i) => self.free.swap_remove(i),
            None => Vec::with_capacity(needed),
        };
        data.clear();
        data.extend_from_slice(key);
        data.extend_from_slice(value);
        Entry {
            data,
            key_len: key.len(),
        }
    }

    /// Return an entry's storage to the pool.
    pub fn release(&mut self, entry: Entry) {
        self.free.push(entry.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_key_and_value() {
        let mut pool = EntryPool::new();
        let e = pool.fetch(b"foo", b"bar");
        assert_eq!(e.key(), b"foo");
        assert_eq!(e.value(), b"bar");
    }

    #[test]
    fn recycles_released_storage() {
        let mut pool = EntryPool::new();
        let e = pool.fetch(b"foo", b"bar");
        pool.release(e);
        assert_eq!(pool.free.len(), 1);
        let e2 = pool.fetch(b"a", b"b");
        assert_eq!(pool.free.len(), 0);
        assert_eq!(e2.key(), b"a");
    }
}
