//! Table heap: rows appended into consecutive slotted pages.
//!
//! A heap owns one data file. Page ids start at 0 and are dense; the
//! first id the file (and the pool) does not know ends the table. All
//! page access goes through a [`BufferPoolManager`], so rows written
//! here stay in memory until a flush or an eviction writes them back.

use std::collections::VecDeque;
use std::fmt;

use log::{debug, trace};

use crate::buffer::BufferPoolManager;
use crate::common::config::MAX_TUPLE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PageStore;
use crate::tuple::{decode_tuple, encode_tuple, Value};

/// Location of a row: page id plus slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: usize,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: usize) -> Self {
        Self { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page_id.0, self.slot)
    }
}

/// Handle to the rows stored in a pool's data file.
///
/// The heap only remembers the last page id; the pages themselves live
/// in the pool passed to each call.
///
/// # Example
/// ```no_run
/// use slotdb::access::TableHeap;
/// use slotdb::tuple::Value;
/// use slotdb::{BufferPoolConfig, BufferPoolManager};
///
/// let mut pool = BufferPoolManager::open(&BufferPoolConfig::default(), "users.heap")?;
/// let mut heap = TableHeap::open(&mut pool)?;
/// let rid = heap.insert(&mut pool, &[Value::Int(1), Value::from("ada")])?;
///
/// for row in heap.scan(&mut pool) {
///     println!("{:?}", row?);
/// }
/// assert!(heap.get(&mut pool, rid)?.is_some());
/// # Ok::<(), slotdb::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableHeap {
    last_page: Option<PageId>,
}

impl TableHeap {
    /// Discover the table in `pool` by probing page ids from 0 until one
    /// is not found.
    pub fn open<S: PageStore>(pool: &mut BufferPoolManager<S>) -> Result<Self> {
        let mut last_page = None;
        let mut probe = PageId::new(0);
        loop {
            match pool.get_page(probe) {
                Ok(_) => {
                    last_page = Some(probe);
                    probe = probe.next();
                }
                Err(e) if e.is_not_found() => break,
                Err(e) => return Err(e),
            }
        }

        debug!(
            "opened table heap {:?} with {} pages",
            pool.path(),
            last_page.map_or(0, |p| p.0 + 1)
        );
        Ok(Self { last_page })
    }

    /// Last page of the table, `None` while it is empty.
    pub fn last_page(&self) -> Option<PageId> {
        self.last_page
    }

    /// Number of pages the table spans.
    pub fn page_count(&self) -> u32 {
        self.last_page.map_or(0, |p| p.0 + 1)
    }

    /// Append a row, starting a new page when the last one is full.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` if the encoded row cannot fit on any page
    /// - errors from encoding or from the pool
    pub fn insert<S: PageStore>(
        &mut self,
        pool: &mut BufferPoolManager<S>,
        values: &[Value],
    ) -> Result<RecordId> {
        let bytes = encode_tuple(values)?;
        if bytes.len() > MAX_TUPLE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "row of {} bytes exceeds the {} byte page capacity",
                bytes.len(),
                MAX_TUPLE_SIZE
            )));
        }

        if let Some(last) = self.last_page {
            let mut page = pool.get_page(last)?.page().clone();
            match page.append(&bytes) {
                Ok(slot) => {
                    pool.update_page(last, page)?;
                    return Ok(RecordId::new(last, slot));
                }
                Err(e) if e.is_capacity() => trace!("{} full, starting a new page", last),
                Err(e) => return Err(e),
            }
        }

        let page_id = self.last_page.map_or(PageId::new(0), |p| p.next());
        let mut page = Page::new(page_id);
        let slot = page.append(&bytes)?;
        pool.update_page(page_id, page)?;
        self.last_page = Some(page_id);
        debug!("table heap grew to {} pages", page_id.0 + 1);

        Ok(RecordId::new(page_id, slot))
    }

    /// Fetch one row. Returns `Ok(None)` for a deleted slot.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page does not exist
    /// - `Error::SlotOutOfRange` if the page has no such slot
    pub fn get<S: PageStore>(
        &self,
        pool: &mut BufferPoolManager<S>,
        rid: RecordId,
    ) -> Result<Option<Vec<Value>>> {
        let slot = pool.get_page(rid.page_id)?;
        slot.page().read_slot(rid.slot)?.map(decode_tuple).transpose()
    }

    /// Iterate over every live row from page 0 onwards.
    pub fn scan<'a, S: PageStore>(&self, pool: &'a mut BufferPoolManager<S>) -> TableScan<'a, S> {
        TableScan::new(pool)
    }
}

/// Sequential scan over a table heap.
///
/// Pages are fetched one at a time; the scan ends at the first page id
/// that does not exist. Deleted slots are skipped. After yielding an
/// error the scan is finished.
pub struct TableScan<'a, S: PageStore> {
    pool: &'a mut BufferPoolManager<S>,
    next_page: PageId,
    pending: VecDeque<(RecordId, Vec<Value>)>,
    done: bool,
}

impl<'a, S: PageStore> TableScan<'a, S> {
    /// Start a scan at page 0.
    pub fn new(pool: &'a mut BufferPoolManager<S>) -> Self {
        Self {
            pool,
            next_page: PageId::new(0),
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Yield rows together with their record ids.
    pub fn with_record_ids(self) -> impl Iterator<Item = Result<(RecordId, Vec<Value>)>> + 'a {
        RecordScan(self)
    }

    /// Decode the live rows of the next page into `pending`.
    ///
    /// Returns `Ok(false)` once the end of the table is reached.
    fn load_next_page(&mut self) -> Result<bool> {
        let page_id = self.next_page;
        let page = match self.pool.get_page(page_id) {
            Ok(slot) => slot.page(),
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };

        for (index, tuple) in page.tuples().enumerate() {
            if let Some(bytes) = tuple? {
                self.pending
                    .push_back((RecordId::new(page_id, index), decode_tuple(bytes)?));
            }
        }
        self.next_page = page_id.next();
        Ok(true)
    }

    fn next_record(&mut self) -> Option<Result<(RecordId, Vec<Value>)>> {
        while !self.done {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            match self.load_next_page() {
                Ok(true) => {}
                Ok(false) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl<S: PageStore> Iterator for TableScan<'_, S> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().map(|r| r.map(|(_, row)| row))
    }
}

struct RecordScan<'a, S: PageStore>(TableScan<'a, S>);

impl<S: PageStore> Iterator for RecordScan<'_, S> {
    type Item = Result<(RecordId, Vec<Value>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::{BufferPoolConfig, ReplacerKind};
    use crate::storage::PageFileStore;
    use tempfile::{tempdir, TempDir};

    fn pool(dir: &TempDir, pool_size: usize) -> BufferPoolManager {
        BufferPoolManager::with_store(
            &BufferPoolConfig::new(pool_size, ReplacerKind::Clock),
            PageFileStore::without_sync(),
            dir.path().join("table.heap"),
        )
        .unwrap()
    }

    fn row(id: i32, name: &str) -> Vec<Value> {
        vec![Value::Int(id), Value::from(name), Value::Null]
    }

    #[test]
    fn test_open_empty_table() {
        let dir = tempdir().unwrap();
        let mut bpm = pool(&dir, 4);

        let heap = TableHeap::open(&mut bpm).unwrap();
        assert_eq!(heap.last_page(), None);
        assert_eq!(heap.page_count(), 0);
        assert_eq!(heap.scan(&mut bpm).count(), 0);
    }

    #[test]
    fn test_insert_and_get() {
        let dir = tempdir().unwrap();
        let mut bpm = pool(&dir, 4);
        let mut heap = TableHeap::open(&mut bpm).unwrap();

        let a = heap.insert(&mut bpm, &row(1, "ada")).unwrap();
        let b = heap.insert(&mut bpm, &row(2, "grace")).unwrap();
        assert_eq!(a, RecordId::new(PageId::new(0), 0));
        assert_eq!(b, RecordId::new(PageId::new(0), 1));

        assert_eq!(heap.get(&mut bpm, b).unwrap(), Some(row(2, "grace")));
        assert!(matches!(
            heap.get(&mut bpm, RecordId::new(PageId::new(0), 5)),
            Err(Error::SlotOutOfRange { .. })
        ));
        assert!(heap.get(&mut bpm, RecordId::new(PageId::new(3), 0)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_insert_spills_to_next_page() {
        let dir = tempdir().unwrap();
        let mut bpm = pool(&dir, 2);
        let mut heap = TableHeap::open(&mut bpm).unwrap();

        let filler = "x".repeat(1000);
        let mut rids = Vec::new();
        for i in 0..20 {
            rids.push(heap.insert(&mut bpm, &row(i, &filler)).unwrap());
        }

        assert!(heap.page_count() >= 3);
        assert_eq!(rids.last().unwrap().page_id, heap.last_page().unwrap());
        // Pool of two pages: earlier pages went through eviction write-back.
        assert!(bpm.stats().snapshot().evictions > 0);

        let scanned: Vec<_> = heap.scan(&mut bpm).map(|r| r.unwrap()).collect();
        assert_eq!(scanned.len(), 20);
        assert_eq!(scanned[19], row(19, &filler));
    }

    #[test]
    fn test_scan_with_record_ids() {
        let dir = tempdir().unwrap();
        let mut bpm = pool(&dir, 4);
        let mut heap = TableHeap::open(&mut bpm).unwrap();

        let inserted: Vec<_> = (0..5)
            .map(|i| heap.insert(&mut bpm, &row(i, "r")).unwrap())
            .collect();
        let scanned: Vec<_> = heap
            .scan(&mut bpm)
            .with_record_ids()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(scanned, inserted);
    }

    #[test]
    fn test_reopen_after_flush() {
        let dir = tempdir().unwrap();
        {
            let mut bpm = pool(&dir, 4);
            let mut heap = TableHeap::open(&mut bpm).unwrap();
            for i in 0..3 {
                heap.insert(&mut bpm, &row(i, "persisted")).unwrap();
            }
            bpm.flush_all_pages().unwrap();
        }

        let mut bpm = pool(&dir, 4);
        let mut heap = TableHeap::open(&mut bpm).unwrap();
        assert_eq!(heap.page_count(), 1);

        let rid = heap.insert(&mut bpm, &row(3, "appended")).unwrap();
        assert_eq!(rid, RecordId::new(PageId::new(0), 3));
        assert_eq!(heap.scan(&mut bpm).count(), 4);
    }

    #[test]
    fn test_insert_row_too_large() {
        let dir = tempdir().unwrap();
        let mut bpm = pool(&dir, 4);
        let mut heap = TableHeap::open(&mut bpm).unwrap();

        let huge = vec![Value::Text("y".repeat(MAX_TUPLE_SIZE))];
        assert!(matches!(
            heap.insert(&mut bpm, &huge),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(heap.page_count(), 0);
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::new(PageId::new(2), 7).to_string(), "(2, 7)");
    }
}
