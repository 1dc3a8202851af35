//! CLOCK (second chance) replacement policy.

use crate::buffer::BufferSlot;
use crate::common::{PageId, Result};

use super::{Replacer, SlotTable};

#[derive(Debug)]
struct ClockEntry {
    page_id: PageId,
    /// Set on every push; cleared once by the sweeping hand.
    referenced: bool,
}

/// Second-chance eviction.
///
/// Candidates sit on a circular list in registration order. The hand
/// sweeps it: a referenced candidate loses its bit and is skipped, the
/// first unreferenced one is evicted. A candidate found pinned (or no
/// longer cached) is dropped from the list on the spot.
#[derive(Debug, Default)]
pub struct ClockReplacer {
    entries: Vec<ClockEntry>,
    hand: usize,
}

impl ClockReplacer {
    /// Create an empty CLOCK replacer.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, page_id: PageId) -> Option<usize> {
        self.entries.iter().position(|e| e.page_id == page_id)
    }

    /// Remove the entry at `index`, keeping the hand on the same logical
    /// successor.
    fn remove_at(&mut self, index: usize) -> PageId {
        let entry = self.entries.remove(index);
        if index < self.hand {
            self.hand -= 1;
        }
        if self.hand >= self.entries.len() {
            self.hand = 0;
        }
        entry.page_id
    }
}

impl Replacer for ClockReplacer {
    fn push(&mut self, slot: &BufferSlot) {
        if slot.is_pinned() {
            return;
        }

        match self.position(slot.page_id()) {
            Some(index) => self.entries[index].referenced = true,
            None => self.entries.push(ClockEntry {
                page_id: slot.page_id(),
                referenced: true,
            }),
        }
    }

    fn delete(&mut self, page_id: PageId) -> Result<()> {
        if let Some(index) = self.position(page_id) {
            self.remove_at(index);
        }
        Ok(())
    }

    /// Sweep from the hand. Clearing a reference bit also ages the
    /// slot's usage count; the hand is left on the victim.
    fn victim(&mut self, slots: &mut SlotTable) -> Option<PageId> {
        // Each step clears a bit or removes an entry, so two laps suffice.
        while !self.entries.is_empty() {
            if self.hand >= self.entries.len() {
                self.hand = 0;
            }

            let page_id = self.entries[self.hand].page_id;
            let slot = match slots.get_mut(&page_id) {
                Some(slot) if !slot.is_pinned() => slot,
                _ => {
                    self.remove_at(self.hand);
                    continue;
                }
            };

            let entry = &mut self.entries[self.hand];
            if !entry.referenced {
                return Some(page_id);
            }
            entry.referenced = false;
            slot.decrement_usage();
            self.hand = (self.hand + 1) % self.entries.len();
        }
        None
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn name(&self) -> &'static str {
        "clock"
    }
}
