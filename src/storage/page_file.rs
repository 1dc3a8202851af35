//! Page file store - stateless file I/O for slotted pages.
//!
//! The [`PageStore`] trait is the seam between the buffer pool and the
//! file system; [`PageFileStore`] is its on-disk implementation. Every
//! call names the file it touches, so one store serves any number of
//! table and catalog files.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Reads and writes whole pages keyed by (page id, file path).
///
/// Implementations perform no caching. Short reads and short writes are
/// always errors.
pub trait PageStore {
    /// Persist `page` into the file at `path`.
    fn write(&self, page: &Page, path: &Path) -> Result<()>;

    /// Load page `page_id` from the file at `path`.
    fn read(&self, page_id: PageId, path: &Path) -> Result<Page>;
}

/// On-disk page store.
///
/// # File Layout
/// Each data file is a flat concatenation of pages:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (8KB)   │ (8KB)   │ (8KB)   │         │ (8KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      8192    16384   ...    N×8192
/// ```
///
/// A page whose id is [`PageId::INVALID`] is appended at the current end
/// of the file.
///
/// # Durability
/// Writes are followed by `fsync()` when `sync_on_write` is set (the
/// default). Tests may turn it off for speed.
#[derive(Debug, Clone, Copy)]
pub struct PageFileStore {
    sync_on_write: bool,
}

impl PageFileStore {
    /// Create a store that fsyncs after every write.
    pub fn new() -> Self {
        Self {
            sync_on_write: true,
        }
    }

    /// Create a store that leaves flushing to the OS.
    pub fn without_sync() -> Self {
        Self {
            sync_on_write: false,
        }
    }

    /// Number of whole pages currently stored in `path` (0 if missing).
    pub fn page_count(&self, path: &Path) -> Result<u32> {
        match fs::metadata(path) {
            Ok(meta) => Ok((meta.len() / PAGE_SIZE as u64) as u32),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for PageFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PageStore for PageFileStore {
    /// Write a page at `page_id × PAGE_SIZE`.
    ///
    /// Parent directories and the file itself are created as needed.
    fn write(&self, page: &Page, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let offset = match page.page_id().file_offset() {
            Some(offset) => offset,
            None => file.metadata()?.len(),
        };

        file.seek(SeekFrom::Start(offset))?;
        file.write_all(page.as_slice())?;
        if self.sync_on_write {
            file.sync_all()?;
        }

        Ok(())
    }

    /// Read page `page_id`.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the file is missing or too short
    /// - `Error::Format` if the bytes are not a valid page
    fn read(&self, page_id: PageId, path: &Path) -> Result<Page> {
        let offset = page_id
            .file_offset()
            .ok_or_else(|| Error::InvalidArgument(format!("cannot read {}", page_id)))?;

        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::PageNotFound(page_id));
            }
            Err(e) => return Err(e.into()),
        };

        if offset + PAGE_SIZE as u64 > file.metadata()?.len() {
            return Err(Error::PageNotFound(page_id));
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; PAGE_SIZE];
        file.read_exact(&mut buf)?;

        Page::from_bytes(page_id, &buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn page_with(page_id: u32, tuple: &[u8]) -> Page {
        let mut page = Page::new(PageId::new(page_id));
        page.append(tuple).unwrap();
        page
    }

    #[test]
    fn test_write_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.heap");
        let store = PageFileStore::new();

        store.write(&page_with(0, b"hello"), &path).unwrap();

        let page = store.read(PageId::new(0), &path).unwrap();
        assert_eq!(page.page_id(), PageId::new(0));
        assert_eq!(page.read_slot(0).unwrap(), Some(&b"hello"[..]));
        assert_eq!(store.page_count(&path).unwrap(), 1);
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("base").join("16384").join("1.dat");
        let store = PageFileStore::without_sync();

        store.write(&page_with(0, b"x"), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_at_page_offset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.heap");
        let store = PageFileStore::without_sync();

        // Writing page 2 first leaves a zero-filled hole for pages 0 and 1.
        store.write(&page_with(2, b"third"), &path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 3 * PAGE_SIZE as u64);

        let page = store.read(PageId::new(2), &path).unwrap();
        assert_eq!(page.read_slot(0).unwrap(), Some(&b"third"[..]));

        // The hole has no magic.
        assert!(matches!(
            store.read(PageId::new(0), &path),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_overwrite_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.heap");
        let store = PageFileStore::without_sync();

        store.write(&page_with(0, b"old"), &path).unwrap();
        store.write(&page_with(1, b"other"), &path).unwrap();
        store.write(&page_with(0, b"new"), &path).unwrap();

        assert_eq!(store.page_count(&path).unwrap(), 2);
        let page = store.read(PageId::new(0), &path).unwrap();
        assert_eq!(page.read_slot(0).unwrap(), Some(&b"new"[..]));
        let page = store.read(PageId::new(1), &path).unwrap();
        assert_eq!(page.read_slot(0).unwrap(), Some(&b"other"[..]));
    }

    #[test]
    fn test_invalid_id_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.heap");
        let store = PageFileStore::without_sync();

        store.write(&page_with(0, b"first"), &path).unwrap();
        store.write(&page_with(u32::MAX, b"appended"), &path).unwrap();

        assert_eq!(store.page_count(&path).unwrap(), 2);
        let page = store.read(PageId::new(1), &path).unwrap();
        assert_eq!(page.read_slot(0).unwrap(), Some(&b"appended"[..]));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.heap");
        let store = PageFileStore::new();

        assert!(matches!(
            store.read(PageId::new(0), &path),
            Err(Error::PageNotFound(_))
        ));
        assert_eq!(store.page_count(&path).unwrap(), 0);
    }

    #[test]
    fn test_read_past_end_of_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.heap");
        let store = PageFileStore::without_sync();

        store.write(&page_with(0, b"only"), &path).unwrap();

        assert!(matches!(
            store.read(PageId::new(1), &path),
            Err(Error::PageNotFound(pid)) if pid == PageId::new(1)
        ));
    }

    #[test]
    fn test_read_truncated_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.heap");
        fs::write(&path, vec![0u8; PAGE_SIZE + 100]).unwrap();

        let store = PageFileStore::new();
        assert!(matches!(
            store.read(PageId::new(1), &path),
            Err(Error::PageNotFound(_))
        ));
    }

    #[test]
    fn test_persistence_across_stores() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.heap");

        PageFileStore::new()
            .write(&page_with(0, b"durable"), &path)
            .unwrap();

        let page = PageFileStore::new().read(PageId::new(0), &path).unwrap();
        assert_eq!(page.read_slot(0).unwrap(), Some(&b"durable"[..]));
    }
}
