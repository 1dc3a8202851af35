//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory, bounded to `pool_size` pages
//! - Explicit pin/unpin to keep pages resident
//! - Dirty page write-back on eviction and flush
//! - Pluggable eviction policies, consulted primary first

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use log::{debug, trace};

use crate::buffer::replacer::{Replacer, SlotTable};
use crate::buffer::{BufferPoolStats, BufferSlot};
use crate::common::config::BufferPoolConfig;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::{PageFileStore, PageStore};

/// Manages a bounded cache of pages from one data file.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                        │
/// │  ┌──────────────────────┐   ┌───────────────────────────┐   │
/// │  │ slots                │   │ replacers                 │   │
/// │  │ PageId → BufferSlot  │◀──│ [primary, secondary?]     │   │
/// │  └──────────────────────┘   └───────────────────────────┘   │
/// │             │ miss / write-back                             │
/// │             ▼                                               │
/// │  ┌──────────────────────┐                                   │
/// │  │ store: PageStore     │── (page id, path) ──▶ data file   │
/// │  └──────────────────────┘                                   │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Ownership
/// A pool has a single logical owner and every operation takes
/// `&mut self`. Callers that share a pool across threads wrap the whole
/// manager in one lock (see [`SharedBufferPool`](super::SharedBufferPool)).
///
/// # Failure atomicity
/// A slot leaves the cache only after its write-back succeeded. When a
/// disk operation fails the call returns the error and the cache entry
/// for that page is left as it was.
///
/// # Usage
/// ```no_run
/// use slotdb::{BufferPoolConfig, BufferPoolManager, Page, PageId};
///
/// let mut bpm = BufferPoolManager::open(&BufferPoolConfig::default(), "t.heap")?;
///
/// let mut page = Page::new(PageId::new(0));
/// page.append(b"row")?;
/// bpm.update_page(PageId::new(0), page)?;
///
/// let slot = bpm.get_page(PageId::new(0))?;
/// assert_eq!(slot.page().read_slot(0)?, Some(&b"row"[..]));
/// bpm.flush_all_pages()?;
/// # Ok::<(), slotdb::Error>(())
/// ```
#[derive(Debug)]
pub struct BufferPoolManager<S: PageStore = PageFileStore> {
    /// Cached pages, at most one slot per page id.
    slots: SlotTable,

    /// Eviction policies in consultation order.
    replacers: Vec<Box<dyn Replacer>>,

    /// Handles all disk I/O.
    store: S,

    /// The data file this pool caches.
    path: PathBuf,

    /// Performance statistics.
    stats: BufferPoolStats,

    /// Maximum number of cached pages (immutable after construction).
    pool_size: usize,
}

impl BufferPoolManager<PageFileStore> {
    /// Create a pool over the data file at `path`, using the on-disk store.
    ///
    /// The file does not need to exist yet.
    pub fn open<P: Into<PathBuf>>(config: &BufferPoolConfig, path: P) -> Result<Self> {
        Self::with_store(config, PageFileStore::new(), path)
    }
}

impl<S: PageStore> BufferPoolManager<S> {
    /// Create a pool with the policies named in `config`.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the pool size is 0 or the config
    /// names no policy or more than two.
    pub fn with_store<P: Into<PathBuf>>(config: &BufferPoolConfig, store: S, path: P) -> Result<Self> {
        let replacers = config.replacers.iter().map(|kind| kind.build()).collect();
        Self::with_replacers(config.pool_size, store, path, replacers)
    }

    /// Create a pool from already constructed replacers.
    pub fn with_replacers<P: Into<PathBuf>>(
        pool_size: usize,
        store: S,
        path: P,
        replacers: Vec<Box<dyn Replacer>>,
    ) -> Result<Self> {
        if pool_size == 0 {
            return Err(Error::InvalidArgument("pool_size must be > 0".into()));
        }
        if replacers.is_empty() || replacers.len() > 2 {
            return Err(Error::InvalidArgument(format!(
                "a pool takes one or two replacers, got {}",
                replacers.len()
            )));
        }

        Ok(Self {
            slots: SlotTable::with_capacity(pool_size),
            replacers,
            store,
            path: path.into(),
            stats: BufferPoolStats::new(),
            pool_size,
        })
    }

    // ========================================================================
    // Public API: Read and write pages
    // ========================================================================

    /// Fetch a page, loading it from disk on a miss.
    ///
    /// A hit bumps the slot's usage count and refreshes it in the
    /// replacers. A miss reads the page first and only then makes room,
    /// so a page that does not exist never costs an eviction.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page is past the end of the file
    /// - `Error::Format` if the bytes on disk are not a valid page
    /// - `Error::NoFreeFrames` if the pool is full and every page is pinned
    pub fn get_page(&mut self, page_id: PageId) -> Result<&BufferSlot> {
        check_page_id(page_id)?;

        if self.slots.contains_key(&page_id) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            trace!("buffer hit {}", page_id);
            if let Some(slot) = self.slots.get_mut(&page_id) {
                slot.increment_usage();
            }
            self.register(page_id);
        } else {
            self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
            trace!("buffer miss {}", page_id);
            let page = self.store.read(page_id, &self.path)?;
            self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

            self.ensure_frame()?;
            self.insert_slot(BufferSlot::new(page_id, page));
        }

        self.slots.get(&page_id).ok_or(Error::PageNotFound(page_id))
    }

    /// Install a new image for a page and mark it dirty.
    ///
    /// If the page is not cached it is inserted straight from `page`
    /// (write-through create) without reading the file, evicting another
    /// page first if the pool is full.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if `page` carries a different id
    /// - `Error::NoFreeFrames` if the pool is full and every page is pinned
    pub fn update_page(&mut self, page_id: PageId, page: Page) -> Result<()> {
        check_page_id(page_id)?;
        if page.page_id() != page_id {
            return Err(Error::InvalidArgument(format!(
                "page image for {} passed as {}",
                page.page_id(),
                page_id
            )));
        }

        if let Some(slot) = self.slots.get_mut(&page_id) {
            slot.replace_page(page);
            slot.mark_dirty();
            self.register(page_id);
        } else {
            self.ensure_frame()?;
            let mut slot = BufferSlot::new(page_id, page);
            slot.mark_dirty();
            self.insert_slot(slot);
        }

        Ok(())
    }

    // ========================================================================
    // Public API: Pinning
    // ========================================================================

    /// Pin a cached page so it cannot be evicted.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page is not cached.
    pub fn pin_page(&mut self, page_id: PageId) -> Result<()> {
        let slot = self
            .slots
            .get_mut(&page_id)
            .ok_or(Error::PageNotFound(page_id))?;
        slot.set_pinned(true);

        for replacer in self.replacers.iter_mut() {
            replacer.delete(page_id)?;
        }
        Ok(())
    }

    /// Unpin a cached page, making it evictable again.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page is not cached.
    pub fn unpin_page(&mut self, page_id: PageId) -> Result<()> {
        let slot = self
            .slots
            .get_mut(&page_id)
            .ok_or(Error::PageNotFound(page_id))?;
        slot.set_pinned(false);

        self.register(page_id);
        Ok(())
    }

    // ========================================================================
    // Public API: Flush pages
    // ========================================================================

    /// Write a cached page to disk if it is dirty.
    ///
    /// Flushing a page that is not cached is a no-op.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` for the sentinel page id
    /// - I/O errors from the disk write (the page stays dirty)
    pub fn flush_page(&mut self, page_id: PageId) -> Result<()> {
        check_page_id(page_id)?;

        match self.slots.get_mut(&page_id) {
            Some(slot) => write_back(&self.store, &self.path, &self.stats, slot),
            None => Ok(()),
        }
    }

    /// Flush every dirty page, in page id order.
    ///
    /// Stops at the first failed write; pages flushed before it stay clean.
    pub fn flush_all_pages(&mut self) -> Result<()> {
        for page_id in self.dirty_pages() {
            self.flush_page(page_id)?;
        }
        Ok(())
    }

    /// Flush at most `max` dirty pages, lowest ids first.
    ///
    /// Returns the number of pages written.
    pub fn flush_dirty_batch(&mut self, max: usize) -> Result<usize> {
        let batch: Vec<PageId> = self.dirty_pages().into_iter().take(max).collect();
        for &page_id in &batch {
            self.flush_page(page_id)?;
        }
        Ok(batch.len())
    }

    /// Snapshot of the ids of all dirty pages, sorted.
    pub fn dirty_pages(&self) -> Vec<PageId> {
        let mut dirty: Vec<PageId> = self
            .slots
            .values()
            .filter(|slot| slot.is_dirty())
            .map(|slot| slot.page_id())
            .collect();
        dirty.sort_unstable();
        dirty
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the number of cached pages.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `page_id` is currently cached.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.slots.contains_key(&page_id)
    }

    /// Peek at a cached slot without touching usage or recency.
    pub fn slot(&self, page_id: PageId) -> Option<&BufferSlot> {
        self.slots.get(&page_id)
    }

    /// The data file this pool caches.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The page store used for I/O.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Names of the active policies, primary first.
    pub fn replacer_names(&self) -> Vec<&'static str> {
        self.replacers.iter().map(|r| r.name()).collect()
    }

    // ========================================================================
    // Internal: Slot table and replacers
    // ========================================================================

    /// (Re-)register a cached, unpinned page with every replacer.
    fn register(&mut self, page_id: PageId) {
        if let Some(slot) = self.slots.get(&page_id) {
            for replacer in self.replacers.iter_mut() {
                replacer.push(slot);
            }
        }
    }

    fn insert_slot(&mut self, slot: BufferSlot) {
        let page_id = slot.page_id();
        self.slots.insert(page_id, slot);
        self.register(page_id);
    }

    /// Make room for one more slot if the pool is full.
    fn ensure_frame(&mut self) -> Result<()> {
        if self.slots.len() < self.pool_size {
            return Ok(());
        }
        self.evict_one().map(|_| ())
    }

    /// Ask the replacers for a victim, primary first.
    ///
    /// The victim stays registered everywhere until it is actually gone.
    fn choose_victim(&mut self) -> Option<PageId> {
        let slots = &mut self.slots;
        self.replacers
            .iter_mut()
            .find_map(|replacer| replacer.victim(slots))
    }

    /// Evict one unpinned page, writing it back first if dirty.
    ///
    /// If the write-back fails the victim stays cached and dirty, and every
    /// replacer keeps it exactly where it was.
    fn evict_one(&mut self) -> Result<PageId> {
        let victim = self
            .choose_victim()
            .ok_or(Error::NoFreeFrames(self.slots.len()))?;

        if let Some(slot) = self.slots.get_mut(&victim) {
            if let Err(e) = write_back(&self.store, &self.path, &self.stats, slot) {
                debug!("write-back of victim {} failed: {}", victim, e);
                return Err(e);
            }
        }

        self.slots.remove(&victim);
        for replacer in self.replacers.iter_mut() {
            replacer.delete(victim)?;
        }

        self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        debug!("evicted {}", victim);
        Ok(victim)
    }
}

/// Reject the sentinel id, which can never name a cached page.
fn check_page_id(page_id: PageId) -> Result<()> {
    if page_id.is_valid() {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("{} is not addressable", page_id)))
    }
}

/// Write `slot` through `store` if it is dirty, then clear the dirty bit.
fn write_back<S: PageStore>(
    store: &S,
    path: &Path,
    stats: &BufferPoolStats,
    slot: &mut BufferSlot,
) -> Result<()> {
    if !slot.is_dirty() {
        return Ok(());
    }

    if let Err(e) = store.write(slot.page(), path) {
        stats.failed_writes.fetch_add(1, Ordering::Relaxed);
        return Err(e);
    }
    slot.clear_dirty();
    stats.pages_written.fetch_add(1, Ordering::Relaxed);
    trace!("wrote back {}", slot.page_id());
    Ok(())
}
