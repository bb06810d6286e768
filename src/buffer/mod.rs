//! Bounded buffers backing a simulation
//!
//! This module provides a trait-based abstraction over the buffer a producer
//! fills and a consumer drains, so the simulation does not care where the
//! items actually live.
//!
//! ## Design
//!
//! - **Trait-based**: `BufferBackend` allows swapping implementations
//! - **Async**: All operations are async so an external store fits the same contract
//! - **Non-blocking**: A full or empty buffer is answered immediately, never waited on
//!
//! ## Backends
//!
//! - **In-Memory** (default): `BoundedBuffer`, a plain FIFO queue
//! - **External store**: `KvBuffer`, one list per simulation inside a shared `KeyValueStore`

pub mod backend;
pub mod kv;
pub mod memory;

pub use backend::BufferBackend;
pub use kv::{KeyValueStore, KvBuffer, MemoryKvStore};
pub use memory::BoundedBuffer;
