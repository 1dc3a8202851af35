//! Configuration constants and tunables for slotdb.

use std::time::Duration;

/// Size of a page in bytes (8KB).
///
/// Every table and catalog file is a flat concatenation of pages of this
/// size; page N lives at file offset `N × PAGE_SIZE`.
pub const PAGE_SIZE: usize = 8192;

/// Magic tag stored little-endian in the first four bytes of every page.
pub const PAGE_MAGIC: u32 = 0x00DD_DDDD;

/// Size of the slotted page header (magic + slot count + lower + upper).
pub const PAGE_HEADER_SIZE: usize = 10;

/// Size of one slot directory entry (offset + length).
pub const SLOT_SIZE: usize = 4;

/// Slot length value marking a logically deleted tuple.
pub const SLOT_DELETED: u16 = 0xFFFF;

/// Largest tuple that fits on an otherwise empty page.
pub const MAX_TUPLE_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE - SLOT_SIZE;

/// Eviction policies a buffer pool can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacerKind {
    /// Second-chance sweep with a per-candidate reference bit.
    Clock,
    /// Least recently used.
    Lru,
}

/// Settings for a [`BufferPoolManager`](crate::buffer::BufferPoolManager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Maximum number of pages held in memory.
    pub pool_size: usize,
    /// Eviction policies in consultation order: a primary and an optional
    /// secondary that is asked only when the primary finds no victim.
    pub replacers: Vec<ReplacerKind>,
}

impl BufferPoolConfig {
    /// Default number of cached pages.
    pub const DEFAULT_POOL_SIZE: usize = 64;

    /// A pool of `pool_size` pages using a single policy.
    pub fn new(pool_size: usize, policy: ReplacerKind) -> Self {
        Self {
            pool_size,
            replacers: vec![policy],
        }
    }

    /// A pool of `pool_size` pages consulting `primary` then `secondary`.
    pub fn dual(pool_size: usize, primary: ReplacerKind, secondary: ReplacerKind) -> Self {
        Self {
            pool_size,
            replacers: vec![primary, secondary],
        }
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_POOL_SIZE, ReplacerKind::Clock)
    }
}

/// Settings for the [`BackgroundWriter`](crate::buffer::BackgroundWriter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Period between full flushes (checkpoints).
    pub checkpoint_interval: Duration,
    /// Period between partial dirty-page flushes.
    pub writer_interval: Duration,
    /// Upper bound on pages written by one partial flush.
    pub max_dirty_pages: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: Duration::from_secs(10),
            writer_interval: Duration::from_secs(1),
            max_dirty_pages: 100,
        }
    }
}
