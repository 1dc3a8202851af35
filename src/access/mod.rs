//! Record storage on top of the buffer pool.
//!
//! - [`TableHeap`] - Append-only heap of encoded rows spread over pages 0..N
//! - [`TableScan`] - Sequential iterator over a heap's rows
//! - [`RecordId`] - Stable address of one row

mod table_heap;

pub use table_heap::{RecordId, TableHeap, TableScan};
