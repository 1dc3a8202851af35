//! slotdb - A slotted-page storage kernel with a bounded buffer pool.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            slotdb                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Access Layer (access/, tuple/)                 │   │
//! │  │       TableHeap + TableScan  ←→  tagged tuple codec      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Buffer Pool (buffer/)                     │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  Eviction Policies: CLOCK | LRU                 │   │   │
//! │  │   │      (primary + optional secondary)             │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  │   BufferPoolManager + BufferSlot + Stats + BgWriter     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Storage Layer (storage/)                  │   │
//! │  │           PageFileStore + slotted Page format            │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, Error, config)
//! - [`storage`] - Page format and page-addressed file I/O
//! - [`buffer`] - Buffer pool management and eviction policies
//! - [`tuple`] - Row values and their byte encoding
//! - [`access`] - Table heaps built on the buffer pool
//!
//! # Quick Start
//! ```no_run
//! use slotdb::{BufferPoolConfig, BufferPoolManager, Page, PageId};
//!
//! let mut bpm = BufferPoolManager::open(&BufferPoolConfig::default(), "my_table.heap")?;
//!
//! let mut page = Page::new(PageId::new(0));
//! let slot = page.append(b"hello")?;
//! bpm.update_page(PageId::new(0), page)?;
//! bpm.flush_page(PageId::new(0))?;
//!
//! let cached = bpm.get_page(PageId::new(0))?;
//! assert_eq!(cached.page().read_slot(slot)?, Some(&b"hello"[..]));
//! # Ok::<(), slotdb::Error>(())
//! ```

pub mod access;
pub mod buffer;
pub mod common;
pub mod storage;
pub mod tuple;

// Re-export commonly used items at crate root for convenience
pub use common::config::{BufferPoolConfig, ReplacerKind, WriterConfig, PAGE_SIZE};
pub use common::{Error, PageId, Result};

pub use buffer::{BufferPoolManager, BufferPoolStats, BufferSlot, SlotState, StatsSnapshot};
pub use storage::page::{Page, PageHeader, SlotEntry};
pub use storage::{PageFileStore, PageStore};
