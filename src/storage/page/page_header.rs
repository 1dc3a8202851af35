//! Page header and slot directory entries.
//!
//! Every page starts with a [`PageHeader`]; the slot directory of
//! [`SlotEntry`] records follows it and grows toward the end of the page.

use crate::common::config::{PAGE_HEADER_SIZE, PAGE_MAGIC, PAGE_SIZE, SLOT_DELETED, SLOT_SIZE};

/// Metadata stored at the beginning of every page.
///
/// # Layout (10 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     magic
/// 4       2     slot_count
/// 6       2     lower (end of the slot directory)
/// 8       2     upper (start of the tuple area)
/// ```
///
/// Free space is the gap `upper - lower` between the directory and the
/// tuple area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Format tag, [`PAGE_MAGIC`] for a valid page.
    pub magic: u32,
    /// Number of entries in the slot directory.
    pub slot_count: u16,
    /// First byte past the slot directory.
    pub lower: u16,
    /// First byte of the packed tuple area.
    pub upper: u16,
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = PAGE_HEADER_SIZE;

    /// Offset of each field within the header.
    pub const OFFSET_MAGIC: usize = 0;
    pub const OFFSET_SLOT_COUNT: usize = 4;
    pub const OFFSET_LOWER: usize = 6;
    pub const OFFSET_UPPER: usize = 8;

    /// Header of a freshly created page: no slots, all space free.
    pub fn empty() -> Self {
        Self {
            magic: PAGE_MAGIC,
            slot_count: 0,
            lower: Self::SIZE as u16,
            upper: PAGE_SIZE as u16,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        let magic = u32::from_le_bytes([
            data[Self::OFFSET_MAGIC],
            data[Self::OFFSET_MAGIC + 1],
            data[Self::OFFSET_MAGIC + 2],
            data[Self::OFFSET_MAGIC + 3],
        ]);

        Self {
            magic,
            slot_count: read_u16(data, Self::OFFSET_SLOT_COUNT),
            lower: read_u16(data, Self::OFFSET_LOWER),
            upper: read_u16(data, Self::OFFSET_UPPER),
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4].copy_from_slice(&self.magic.to_le_bytes());
        write_u16(data, Self::OFFSET_SLOT_COUNT, self.slot_count);
        write_u16(data, Self::OFFSET_LOWER, self.lower);
        write_u16(data, Self::OFFSET_UPPER, self.upper);
    }

    /// Whether the magic tag matches.
    #[inline]
    pub fn has_valid_magic(&self) -> bool {
        self.magic == PAGE_MAGIC
    }

    /// Whether the free-space bounds and slot count agree with each other.
    pub fn is_consistent(&self) -> bool {
        let lower = self.lower as usize;
        let upper = self.upper as usize;
        lower == Self::SIZE + self.slot_count as usize * SLOT_SIZE
            && lower <= upper
            && upper <= PAGE_SIZE
    }

    /// Bytes available between the slot directory and the tuple area.
    #[inline]
    pub fn free_space(&self) -> usize {
        (self.upper as usize).saturating_sub(self.lower as usize)
    }
}

/// One entry of the slot directory.
///
/// # Layout (4 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       2     offset of the tuple within the page
/// 2       2     length of the tuple (0xFFFF = deleted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEntry {
    pub offset: u16,
    pub length: u16,
}

impl SlotEntry {
    /// Size of an entry in bytes.
    pub const SIZE: usize = SLOT_SIZE;

    /// Byte position of directory entry `index` within a page.
    #[inline]
    pub fn position(index: usize) -> usize {
        PageHeader::SIZE + index * Self::SIZE
    }

    pub fn from_bytes(data: &[u8], index: usize) -> Self {
        let pos = Self::position(index);
        Self {
            offset: read_u16(data, pos),
            length: read_u16(data, pos + 2),
        }
    }

    pub fn write_to(&self, data: &mut [u8], index: usize) {
        let pos = Self::position(index);
        write_u16(data, pos, self.offset);
        write_u16(data, pos + 2, self.length);
    }

    /// Whether the slot carries the deleted marker.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.length == SLOT_DELETED
    }
}

#[inline]
fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

#[inline]
fn write_u16(data: &mut [u8], pos: usize, value: u16) {
    data[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
}
