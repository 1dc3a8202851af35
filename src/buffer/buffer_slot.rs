//! BufferSlot - one cached page in the buffer pool.
//!
//! A [`BufferSlot`] holds a [`Page`] plus the metadata needed for buffer
//! management:
//! - Pin/dirty state as a single [`SlotState`]
//! - A usage counter bumped on every cache hit

use crate::common::PageId;
use crate::storage::page::Page;

/// Pin and dirty state of a cached page.
///
/// ```text
///            pin                 unpin
///   Clean ──────────▶ Pinned{dirty: false} ──────▶ Clean
///   Dirty ──────────▶ Pinned{dirty: true}  ──────▶ Dirty
/// ```
/// Writes move `Clean → Dirty` (or set `dirty` while pinned), flushes move
/// back. Only the unpinned states can be handed to the evictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// Unpinned and identical to the on-disk copy.
    #[default]
    Clean,
    /// Unpinned with changes not yet written back.
    Dirty,
    /// Held by a caller; never evicted.
    Pinned { dirty: bool },
}

impl SlotState {
    #[inline]
    pub fn is_pinned(&self) -> bool {
        matches!(self, SlotState::Pinned { .. })
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        matches!(self, SlotState::Dirty | SlotState::Pinned { dirty: true })
    }

    /// The same state with the dirty bit set.
    #[inline]
    fn dirtied(self) -> Self {
        match self {
            SlotState::Clean | SlotState::Dirty => SlotState::Dirty,
            SlotState::Pinned { .. } => SlotState::Pinned { dirty: true },
        }
    }

    /// The same state with the dirty bit cleared.
    #[inline]
    fn cleaned(self) -> Self {
        match self {
            SlotState::Clean | SlotState::Dirty => SlotState::Clean,
            SlotState::Pinned { .. } => SlotState::Pinned { dirty: false },
        }
    }

    /// The state after pinning (`true`) or unpinning (`false`).
    #[inline]
    fn with_pinned(self, pinned: bool) -> Self {
        let dirty = self.is_dirty();
        match (pinned, dirty) {
            (true, dirty) => SlotState::Pinned { dirty },
            (false, true) => SlotState::Dirty,
            (false, false) => SlotState::Clean,
        }
    }
}

/// A cached page in the buffer pool.
///
/// Slots are created on the first read or write-through create of a page
/// and live until they are evicted or the pool is dropped. The
/// [`BufferPoolManager`](super::BufferPoolManager) is the only code that
/// mutates them.
#[derive(Debug, Clone)]
pub struct BufferSlot {
    page_id: PageId,
    page: Page,
    state: SlotState,
    usage_count: u32,
}

impl BufferSlot {
    /// Wrap a freshly loaded page: clean, unpinned, unused.
    pub fn new(page_id: PageId, page: Page) -> Self {
        Self {
            page_id,
            page,
            state: SlotState::Clean,
            usage_count: 0,
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// The cached page.
    #[inline]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[inline]
    pub fn state(&self) -> SlotState {
        self.state
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.state.is_pinned()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    #[inline]
    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }

    // ========================================================================
    // Mutators (called by the buffer pool only)
    // ========================================================================

    pub(crate) fn mark_dirty(&mut self) {
        self.state = self.state.dirtied();
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.state = self.state.cleaned();
    }

    pub(crate) fn set_pinned(&mut self, pinned: bool) {
        self.state = self.state.with_pinned(pinned);
    }

    pub(crate) fn increment_usage(&mut self) {
        self.usage_count = self.usage_count.saturating_add(1);
    }

    /// Decrement the usage counter, stopping at zero. The clock sweep
    /// calls this when it clears a candidate's reference bit.
    pub(crate) fn decrement_usage(&mut self) {
        self.usage_count = self.usage_count.saturating_sub(1);
    }

    /// Swap in a new page image, keeping pin and usage metadata.
    pub(crate) fn replace_page(&mut self, page: Page) {
        self.page = page;
    }
}
