//! Error types for slotdb.

use thiserror::Error;

use super::PageId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in the storage layer.
///
/// Every error is surfaced synchronously to the immediate caller. The
/// storage layer never retries on its own.
#[derive(Debug, Error)]
pub enum Error {
    /// A byte buffer could not be decoded: wrong size, bad magic, or a
    /// malformed tuple.
    #[error("format error: {0}")]
    Format(String),

    /// A page has too little free space for a tuple.
    #[error("page {page_id} is full: need {needed} bytes, {available} available")]
    PageFull {
        page_id: PageId,
        needed: usize,
        available: usize,
    },

    /// The buffer pool is at capacity and every cached page is pinned.
    #[error("no evictable frame: all {0} cached pages are pinned")]
    NoFreeFrames(usize),

    /// The page is not cached, or lies past the end of its file.
    #[error("{0} not found")]
    PageNotFound(PageId),

    /// A slot index outside `[0, slot_count)`.
    #[error("slot {index} out of range for page with {slot_count} slots")]
    SlotOutOfRange { index: usize, slot_count: usize },

    /// Malformed caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is one of the capacity errors (page full, pool pinned).
    pub fn is_capacity(&self) -> bool {
        matches!(self, Error::PageFull { .. } | Error::NoFreeFrames(_))
    }

    /// Whether this error signals a missing page.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::PageNotFound(_))
    }
}
