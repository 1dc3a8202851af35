//! Page identifier type.

use std::fmt;

use super::config::PAGE_SIZE;

/// Identifies a page within one data file.
///
/// Page N occupies bytes `[N × PAGE_SIZE, (N + 1) × PAGE_SIZE)` of its file.
/// The id is assigned once when a page is created and never changes.
///
/// # Example
/// ```
/// use slotdb::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Invalid/sentinel page ID.
    ///
    /// Writing a page carrying this id appends it at the current end of
    /// the file instead of at a fixed offset.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Byte offset of this page in its file, or `None` for the sentinel.
    #[inline]
    pub fn file_offset(&self) -> Option<u64> {
        self.is_valid()
            .then(|| (self.0 as u64) * (PAGE_SIZE as u64))
    }

    /// The id following this one.
    #[inline]
    pub fn next(&self) -> PageId {
        PageId(self.0 + 1)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_new() {
        let pid = PageId::new(42);
        assert_eq!(pid.0, 42);
        assert!(pid.is_valid());
    }

    #[test]
    fn test_page_id_invalid() {
        assert!(!PageId::INVALID.is_valid());
        assert_eq!(PageId::INVALID.0, u32::MAX);
        assert_eq!(PageId::INVALID.file_offset(), None);
    }

    #[test]
    fn test_page_id_file_offset() {
        assert_eq!(PageId::new(0).file_offset(), Some(0));
        assert_eq!(PageId::new(3).file_offset(), Some(3 * 8192));
    }

    #[test]
    fn test_page_id_ordering() {
        assert!(PageId::new(1) < PageId::new(2));
        assert_eq!(PageId::new(4).next(), PageId::new(5));
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(42)), "Page(42)");
        assert_eq!(format!("{}", PageId::INVALID), "Page(INVALID)");
    }
}
