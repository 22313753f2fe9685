//! Bounded FIFO of key selections waiting for the foreground loop.

use std::collections::VecDeque;

pub const KEY_QUEUE_CAPACITY: usize = 256;

/// One entry in the key queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuedKey {
    /// A registered key code.
    Key(u16),
    /// An absolute menu row picked by a touch tap.
    MenuRow(usize),
    /// Injected by `cancel_wait_key`; the consumer treats it as "no key".
    Cancel,
}

/// Fixed-capacity queue. Pushing onto a full queue drops the new entry.
#[derive(Debug)]
pub struct KeyQueue {
    entries: VecDeque<QueuedKey>,
    capacity: usize,
}

impl KeyQueue {
    pub fn new() -> Self {
        Self::with_capacity(KEY_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `key`. Returns false (and leaves the queue untouched) when full.
    pub fn push(&mut self, key: QueuedKey) -> bool {
        if self.entries.len() >= self.capacity {
            return false;
        }
        self.entries.push_back(key);
        true
    }

    pub fn pop(&mut self) -> Option<QueuedKey> {
        self.entries.pop_front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeyQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = KeyQueue::new();
        q.push(QueuedKey::Key(1));
        q.push(QueuedKey::MenuRow(4));
        q.push(QueuedKey::Key(2));
        assert_eq!(q.pop(), Some(QueuedKey::Key(1)));
        assert_eq!(q.pop(), Some(QueuedKey::MenuRow(4)));
        assert_eq!(q.pop(), Some(QueuedKey::Key(2)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let mut q = KeyQueue::new();
        for i in 0..KEY_QUEUE_CAPACITY {
            assert!(q.push(QueuedKey::Key(i as u16)));
        }
        assert!(!q.push(QueuedKey::Key(999)));
        assert_eq!(q.len(), KEY_QUEUE_CAPACITY);
        assert_eq!(q.pop(), Some(QueuedKey::Key(0)));

        let mut last = None;
        while let Some(k) = q.pop() {
            last = Some(k);
        }
        assert_eq!(last, Some(QueuedKey::Key((KEY_QUEUE_CAPACITY - 1) as u16)));
    }

    #[test]
    fn test_clear() {
        let mut q = KeyQueue::with_capacity(2);
        q.push(QueuedKey::Key(1));
        q.push(QueuedKey::Cancel);
        q.clear();
        assert!(q.is_empty());
        assert!(q.push(QueuedKey::Key(3)));
    }
}
