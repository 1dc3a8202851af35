//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between the access
//! methods and disk. It holds at most `pool_size` pages, each in a
//! [`BufferSlot`].
//!
//! # Components
//! - [`BufferPoolManager`] - The main page cache
//! - [`BufferSlot`] / [`SlotState`] - A cached page + pin/dirty metadata
//! - [`BackgroundWriter`] - Periodic checkpoint and dirty-page flushing
//! - [`BufferPoolStats`] - Performance statistics
//! - [`replacer`] - Eviction policy implementations

mod background_writer;
mod buffer_pool_manager;
mod buffer_slot;
pub mod replacer;
mod stats;

pub use background_writer::{shared, BackgroundWriter, SharedBufferPool};
pub use buffer_pool_manager::BufferPoolManager;
pub use buffer_slot::{BufferSlot, SlotState};
pub use stats::{BufferPoolStats, StatsSnapshot};
