//! LRU (Least Recently Used) replacement policy.

use std::collections::{BTreeMap, HashMap};

use crate::buffer::BufferSlot;
use crate::common::{Error, PageId, Result};

use super::{Replacer, SlotTable};

/// Least-recently-used eviction.
///
/// Every push stamps the candidate with a fresh, monotonically increasing
/// tick. `order` is the recency list (smallest tick = least recent) and
/// `index` maps a page id back to its tick, so moves and removals are
/// `O(log n)`.
#[derive(Debug, Default)]
pub struct LruReplacer {
    /// Recency list: tick → page id.
    order: BTreeMap<u64, PageId>,
    /// Page id → tick of its last push.
    index: HashMap<PageId, u64>,
    /// Source of ticks.
    tick: u64,
}

impl LruReplacer {
    /// Create an empty LRU replacer.
    pub fn new() -> Self {
        Self::default()
    }

    fn unlink(&mut self, page_id: PageId) -> bool {
        match self.index.remove(&page_id) {
            Some(tick) => {
                self.order.remove(&tick);
                true
            }
            None => false,
        }
    }
}

impl Replacer for LruReplacer {
    /// Move `slot` to the most-recent end.
    fn push(&mut self, slot: &BufferSlot) {
        if slot.is_pinned() {
            return;
        }

        let page_id = slot.page_id();
        self.unlink(page_id);

        self.tick += 1;
        self.order.insert(self.tick, page_id);
        self.index.insert(page_id, self.tick);
    }

    /// # Errors
    /// Returns `Error::InvalidArgument` for the sentinel page id.
    fn delete(&mut self, page_id: PageId) -> Result<()> {
        if !page_id.is_valid() {
            return Err(Error::InvalidArgument(format!(
                "cannot delete {} from lru replacer",
                page_id
            )));
        }
        self.unlink(page_id);
        Ok(())
    }

    /// The least-recent candidate.
    fn victim(&mut self, slots: &mut SlotTable) -> Option<PageId> {
        while let Some((&tick, &page_id)) = self.order.first_key_value() {
            if slots.get(&page_id).is_some_and(|s| !s.is_pinned()) {
                return Some(page_id);
            }
            // Pinned or already evicted: stale candidate, drop it.
            self.order.remove(&tick);
            self.index.remove(&page_id);
        }
        None
    }

    fn size(&self) -> usize {
        self.index.len()
    }

    fn name(&self) -> &'static str {
        "lru"
    }
}
