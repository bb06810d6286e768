//! In-memory buffer backend
//!
//! A fixed-capacity FIFO queue living inside the simulation actor. This is
//! the default backend and the reference for the `BufferBackend` contract.

use std::collections::VecDeque;

use async_trait::async_trait;
use tracing::trace;

use super::backend::BufferBackend;
use crate::Item;
use crate::config::BufferKind;

/// Fixed-capacity FIFO queue that rejects inserts when full
#[derive(Debug, Clone)]
pub struct BoundedBuffer {
    contents: VecDeque<Item>,
    capacity: usize,
}

impl BoundedBuffer {
    /// Create an empty buffer
    ///
    /// The capacity is validated by the configuration before any buffer is
    /// built; a zero capacity yields a buffer that rejects everything.
    pub fn new(capacity: usize) -> Self {
        Self {
            contents: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn try_insert(&mut self, item: Item) -> bool {
        if self.contents.len() >= self.capacity {
            trace!("buffer full ({}), rejecting {item}", self.capacity);
            return false;
        }
        self.contents.push_back(item);
        true
    }

    pub fn try_remove(&mut self) -> Option<Item> {
        self.contents.pop_front()
    }

    pub fn size(&self) -> usize {
        self.contents.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.contents.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.contents.iter()
    }
}

#[async_trait]
impl BufferBackend for BoundedBuffer {
    async fn try_insert(&mut self, item: Item) -> bool {
        BoundedBuffer::try_insert(self, item)
    }

    async fn try_remove(&mut self) -> Option<Item> {
        BoundedBuffer::try_remove(self)
    }

    async fn size(&self) -> usize {
        BoundedBuffer::size(self)
    }

    async fn items(&self) -> Vec<Item> {
        self.contents.iter().copied().collect()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn kind(&self) -> BufferKind {
        BufferKind::InMemory
    }

    async fn close(&mut self) {
        trace!("closing in-memory buffer ({} items dropped)", self.contents.len());
        self.contents.clear();
    }
}
