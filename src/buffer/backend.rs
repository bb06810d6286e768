//! Buffer backend trait definition
//!
//! This module defines the core `BufferBackend` trait that all
//! buffer implementations must implement.

use async_trait::async_trait;

use crate::Item;
use crate::config::BufferKind;

/// Trait for bounded FIFO buffers
///
/// ## Contract
///
/// - `try_insert` appends and returns `true`, or returns `false` when the
///   buffer already holds `capacity` items. An existing item is never evicted.
/// - `try_remove` hands out the oldest item, or `None` when empty.
/// - `size` never mutates.
///
/// Fullness and emptiness are steady-state outcomes of the simulation, so
/// none of these methods can fail.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; the owning simulation actor moves
/// them into its own task.
#[async_trait]
pub trait BufferBackend: Send + Sync {
    /// Append an item unless the buffer is full
    async fn try_insert(&mut self, item: Item) -> bool;

    /// Remove the oldest item, if any
    async fn try_remove(&mut self) -> Option<Item>;

    /// Current number of items
    async fn size(&self) -> usize;

    /// All items, oldest first
    ///
    /// Used for status snapshots only.
    async fn items(&self) -> Vec<Item>;

    /// Fixed capacity chosen at construction
    fn capacity(&self) -> usize;

    /// Which kind of store this is
    fn kind(&self) -> BufferKind;

    /// Release the backing storage
    ///
    /// Called once when the owning simulation stops.
    async fn close(&mut self);
}
