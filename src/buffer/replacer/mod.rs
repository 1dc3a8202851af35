//! Eviction policy implementations (replacers).
//!
//! Implements:
//! - [`ClockReplacer`] - Second chance with a per-candidate reference bit
//! - [`LruReplacer`] - Least recently used
//!
//! A replacer tracks *which* cached pages may be evicted, by page id. It
//! never owns the [`BufferSlot`]s themselves; when choosing a victim it
//! looks candidates up in the pool's slot table so that a slot found
//! pinned (or already gone) is never returned.

mod clock;
mod lru;

use std::collections::HashMap;
use std::fmt::Debug;

pub use clock::ClockReplacer;
pub use lru::LruReplacer;

use crate::buffer::BufferSlot;
use crate::common::config::ReplacerKind;
use crate::common::{PageId, Result};

/// The pool's cache: page id → slot.
pub type SlotTable = HashMap<PageId, BufferSlot>;

/// An eviction policy.
pub trait Replacer: Send + Debug {
    /// Register `slot` as an eviction candidate, or refresh it if it is
    /// already one. A pinned slot is ignored.
    fn push(&mut self, slot: &BufferSlot);

    /// Withdraw `page_id` from the candidates (on pin and on eviction).
    ///
    /// Deleting an id that is not a candidate is not an error.
    fn delete(&mut self, page_id: PageId) -> Result<()>;

    /// Choose one unpinned candidate without withdrawing it.
    ///
    /// Candidates found pinned or no longer cached are dropped along the
    /// way, and a sweeping policy may age the slots it passes over. The
    /// chosen page stays registered until [`delete`](Self::delete), so
    /// asking again without an intervening push returns the same page.
    fn victim(&mut self, slots: &mut SlotTable) -> Option<PageId>;

    /// Choose, remove and return one unpinned candidate.
    ///
    /// Returns `None` when no candidate is left.
    fn pick_victim(&mut self, slots: &mut SlotTable) -> Option<PageId> {
        let victim = self.victim(slots)?;
        self.delete(victim).ok().map(|_| victim)
    }

    /// Number of registered candidates.
    fn size(&self) -> usize;

    /// Short policy name for logging.
    fn name(&self) -> &'static str;
}

impl ReplacerKind {
    /// Construct an empty replacer of this kind.
    pub fn build(self) -> Box<dyn Replacer> {
        match self {
            ReplacerKind::Clock => Box::new(ClockReplacer::new()),
            ReplacerKind::Lru => Box::new(LruReplacer::new()),
        }
    }
}
