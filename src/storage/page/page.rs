//! Page - the fundamental 8KB unit of storage.
//!
//! A [`Page`] is an 8KB slotted buffer identified by a [`PageId`]. It is
//! the unit of I/O between disk and memory and the unit cached by the
//! buffer pool.

use crate::common::config::{PAGE_SIZE, SLOT_SIZE};
use crate::common::{Error, PageId, Result};

use super::page_header::{PageHeader, SlotEntry};

/// A slotted page of data (8KB).
///
/// # Memory Layout
/// ```text
/// ┌────────┬──────────────────┬──────────────┬──────────────────────┐
/// │ header │ slot directory → │  free space  │ ← tuple bytes        │
/// │ 10 B   │ 4 B per slot     │              │ packed from the tail │
/// └────────┴──────────────────┴──────────────┴──────────────────────┘
///          ^ 10               ^ lower        ^ upper                ^ 8192
/// ```
///
/// Slots are append-only: [`Page::append`] grows the directory and the
/// tuple area toward each other, and an existing slot never moves.
///
/// # Example
/// ```
/// use slotdb::{Page, PageId};
///
/// let mut page = Page::new(PageId::new(0));
/// let slot = page.append(b"hello").unwrap();
/// assert_eq!(page.read_slot(slot).unwrap(), Some(&b"hello"[..]));
/// ```
#[derive(Clone)]
pub struct Page {
    page_id: PageId,
    data: Box<[u8; PAGE_SIZE]>,
}

impl Page {
    /// Create an empty page: valid magic, no slots, all space free.
    pub fn new(page_id: PageId) -> Self {
        let mut data = Box::new([0u8; PAGE_SIZE]);
        PageHeader::empty().write_to(data.as_mut_slice());
        Self { page_id, data }
    }

    /// Decode a page from raw bytes.
    ///
    /// # Errors
    /// Returns `Error::Format` if `bytes` is not exactly `PAGE_SIZE` long,
    /// the magic tag is wrong, or the header bounds are inconsistent.
    pub fn from_bytes(page_id: PageId, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PAGE_SIZE {
            return Err(Error::Format(format!(
                "{}: expected {} bytes, got {}",
                page_id,
                PAGE_SIZE,
                bytes.len()
            )));
        }

        let header = PageHeader::from_bytes(bytes);
        if !header.has_valid_magic() {
            return Err(Error::Format(format!(
                "{}: bad magic {:#010x}",
                page_id, header.magic
            )));
        }
        if !header.is_consistent() {
            return Err(Error::Format(format!(
                "{}: corrupt header (slots {}, lower {}, upper {})",
                page_id, header.slot_count, header.lower, header.upper
            )));
        }

        let mut data = Box::new([0u8; PAGE_SIZE]);
        data.copy_from_slice(bytes);
        Ok(Self { page_id, data })
    }

    /// The id this page was created with.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Get the size of a page.
    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }

    /// Read the page header.
    #[inline]
    pub fn header(&self) -> PageHeader {
        PageHeader::from_bytes(self.data.as_slice())
    }

    /// Whether the magic tag is intact.
    pub fn is_valid(&self) -> bool {
        self.header().has_valid_magic()
    }

    /// Number of slots in the directory, deleted ones included.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.header().slot_count as usize
    }

    /// Bytes between the end of the slot directory and the tuple area.
    #[inline]
    pub fn free_space(&self) -> usize {
        self.header().free_space()
    }

    /// Whether a tuple of `len` bytes (plus its slot entry) still fits.
    #[inline]
    pub fn can_fit(&self, len: usize) -> bool {
        self.free_space() >= SLOT_SIZE + len
    }

    /// Append a tuple, returning its slot index.
    ///
    /// The tuple is written so that it ends at the current `upper` bound,
    /// and a directory entry is added at `lower`.
    ///
    /// # Errors
    /// Returns `Error::PageFull` if the free space is smaller than the
    /// tuple plus one slot entry. The page is left untouched.
    pub fn append(&mut self, tuple: &[u8]) -> Result<usize> {
        let mut header = self.header();
        let needed = SLOT_SIZE + tuple.len();
        if header.free_space() < needed {
            return Err(Error::PageFull {
                page_id: self.page_id,
                needed,
                available: header.free_space(),
            });
        }

        let index = header.slot_count as usize;
        let new_upper = header.upper as usize - tuple.len();
        self.data[new_upper..new_upper + tuple.len()].copy_from_slice(tuple);

        SlotEntry {
            offset: new_upper as u16,
            length: tuple.len() as u16,
        }
        .write_to(self.data.as_mut_slice(), index);

        header.upper = new_upper as u16;
        header.lower += SLOT_SIZE as u16;
        header.slot_count += 1;
        header.write_to(self.data.as_mut_slice());

        Ok(index)
    }

    /// Directory entry of slot `index`.
    ///
    /// # Errors
    /// Returns `Error::SlotOutOfRange` outside `[0, slot_count)`.
    pub fn slot(&self, index: usize) -> Result<SlotEntry> {
        let slot_count = self.slot_count();
        if index >= slot_count {
            return Err(Error::SlotOutOfRange { index, slot_count });
        }
        Ok(SlotEntry::from_bytes(self.data.as_slice(), index))
    }

    /// Read the tuple stored in slot `index`.
    ///
    /// Returns `Ok(None)` for a logically deleted slot.
    ///
    /// # Errors
    /// - `Error::SlotOutOfRange` outside `[0, slot_count)`
    /// - `Error::Format` if the entry points outside the page
    pub fn read_slot(&self, index: usize) -> Result<Option<&[u8]>> {
        let entry = self.slot(index)?;
        if entry.is_deleted() {
            return Ok(None);
        }

        let start = entry.offset as usize;
        let end = start + entry.length as usize;
        if start < self.header().lower as usize || end > PAGE_SIZE {
            return Err(Error::Format(format!(
                "{}: slot {} spans {}..{} outside the tuple area",
                self.page_id, index, start, end
            )));
        }
        Ok(Some(&self.data[start..end]))
    }

    /// Iterate over every slot in directory order.
    pub fn tuples(&self) -> impl Iterator<Item = Result<Option<&[u8]>>> + '_ {
        (0..self.slot_count()).map(move |index| self.read_slot(index))
    }

    /// The full page image, for persistence.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        self.data.as_slice()
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header = self.header();
        f.debug_struct("Page")
            .field("page_id", &self.page_id)
            .field("slot_count", &header.slot_count)
            .field("lower", &header.lower)
            .field("upper", &header.upper)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::{PAGE_HEADER_SIZE, SLOT_DELETED};
    use proptest::prelude::*;

    #[test]
    fn test_page_new() {
        let page = Page::new(PageId::new(7));
        assert_eq!(page.page_id(), PageId::new(7));
        assert!(page.is_valid());
        assert_eq!(page.slot_count(), 0);
        assert_eq!(page.free_space(), PAGE_SIZE - PAGE_HEADER_SIZE);
        assert_eq!(page.as_slice().len(), PAGE_SIZE);
    }

    #[test]
    fn test_append_three_tuples() {
        let mut page = Page::new(PageId::new(0));

        page.append(&[1u8; 10]).unwrap();
        page.append(&[2u8; 20]).unwrap();
        page.append(&[3u8; 30]).unwrap();

        assert_eq!(page.slot_count(), 3);
        assert_eq!(page.free_space(), 8192 - 10 - 3 * 4 - (10 + 20 + 30));

        assert_eq!(page.read_slot(0).unwrap(), Some(&[1u8; 10][..]));
        assert_eq!(page.read_slot(1).unwrap(), Some(&[2u8; 20][..]));
        assert_eq!(page.read_slot(2).unwrap(), Some(&[3u8; 30][..]));
    }

    #[test]
    fn test_tuples_packed_from_tail() {
        let mut page = Page::new(PageId::new(0));
        page.append(b"abcd").unwrap();

        let header = page.header();
        assert_eq!(header.upper as usize, PAGE_SIZE - 4);
        assert_eq!(header.lower as usize, PAGE_HEADER_SIZE + SLOT_SIZE);
        assert_eq!(&page.as_slice()[PAGE_SIZE - 4..], b"abcd");
    }

    #[test]
    fn test_append_empty_tuple() {
        let mut page = Page::new(PageId::new(0));
        let slot = page.append(&[]).unwrap();
        assert_eq!(page.read_slot(slot).unwrap(), Some(&[][..]));
    }

    #[test]
    fn test_append_full_page_fails() {
        let mut page = Page::new(PageId::new(3));
        let before = page.header();

        let too_big = vec![0u8; page.free_space() - SLOT_SIZE + 1];
        let err = page.append(&too_big).unwrap_err();
        assert!(matches!(err, Error::PageFull { .. }));
        assert_eq!(page.header(), before);

        // Exactly fitting tuple succeeds and leaves no free space.
        let exact = vec![9u8; page.free_space() - SLOT_SIZE];
        page.append(&exact).unwrap();
        assert_eq!(page.free_space(), 0);
        assert!(!page.can_fit(0));
    }

    #[test]
    fn test_read_slot_out_of_range() {
        let mut page = Page::new(PageId::new(0));
        assert!(matches!(
            page.read_slot(0),
            Err(Error::SlotOutOfRange {
                index: 0,
                slot_count: 0
            })
        ));

        page.append(b"x").unwrap();
        assert!(page.read_slot(0).is_ok());
        assert!(matches!(page.read_slot(1), Err(Error::SlotOutOfRange { .. })));
    }

    #[test]
    fn test_read_deleted_slot() {
        let mut page = Page::new(PageId::new(0));
        page.append(b"gone").unwrap();
        page.append(b"kept").unwrap();

        // Tombstone slot 0 directly in the image, as a deleter would.
        let mut bytes = page.as_slice().to_vec();
        let mut entry = SlotEntry::from_bytes(&bytes, 0);
        entry.length = SLOT_DELETED;
        entry.write_to(&mut bytes, 0);

        let page = Page::from_bytes(PageId::new(0), &bytes).unwrap();
        assert_eq!(page.read_slot(0).unwrap(), None);
        assert_eq!(page.read_slot(1).unwrap(), Some(&b"kept"[..]));

        let live: Vec<_> = page.tuples().map(|t| t.unwrap()).collect();
        assert_eq!(live, vec![None, Some(&b"kept"[..])]);
    }

    #[test]
    fn test_from_bytes_wrong_size() {
        let result = Page::from_bytes(PageId::new(0), &[0u8; 100]);
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_from_bytes_bad_magic() {
        let result = Page::from_bytes(PageId::new(0), &[0u8; PAGE_SIZE]);
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_from_bytes_roundtrip() {
        let mut page = Page::new(PageId::new(5));
        page.append(b"persist me").unwrap();

        let copy = Page::from_bytes(PageId::new(5), page.as_slice()).unwrap();
        assert_eq!(copy.slot_count(), 1);
        assert_eq!(copy.read_slot(0).unwrap(), Some(&b"persist me"[..]));
        assert_eq!(copy.as_slice(), page.as_slice());
    }

    #[test]
    fn test_slot_pointing_outside_page() {
        let mut page = Page::new(PageId::new(0));
        page.append(b"abc").unwrap();

        let mut bytes = page.as_slice().to_vec();
        SlotEntry {
            offset: (PAGE_SIZE - 2) as u16,
            length: 3,
        }
        .write_to(&mut bytes, 0);

        let page = Page::from_bytes(PageId::new(0), &bytes).unwrap();
        assert!(matches!(page.read_slot(0), Err(Error::Format(_))));
    }

    proptest! {
        #[test]
        fn prop_failed_append_leaves_header_unchanged(
            sizes in proptest::collection::vec(0usize..600, 1..40),
        ) {
            let mut page = Page::new(PageId::new(1));
            for size in sizes {
                let before = page.header();
                let tuple = vec![0xAB; size];
                match page.append(&tuple) {
                    Ok(slot) => {
                        prop_assert_eq!(slot, before.slot_count as usize);
                        prop_assert_eq!(page.free_space(), before.free_space() - SLOT_SIZE - size);
                    }
                    Err(Error::PageFull { .. }) => {
                        prop_assert!(before.free_space() < SLOT_SIZE + size);
                        prop_assert_eq!(page.header(), before);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {}", other),
                }
                prop_assert!(page.header().lower <= page.header().upper);
            }
        }

        #[test]
        fn prop_appended_tuples_read_back(
            tuples in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..200), 0..30),
        ) {
            let mut page = Page::new(PageId::new(2));
            for tuple in &tuples {
                page.append(tuple).unwrap();
            }
            for (index, tuple) in tuples.iter().enumerate() {
                prop_assert_eq!(page.read_slot(index).unwrap(), Some(tuple.as_slice()));
            }
        }
    }
}
