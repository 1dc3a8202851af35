//! Storage layer - disk I/O and page formats.
//!
//! This module handles persistent storage:
//! - [`PageStore`] / [`PageFileStore`] - Page-addressed file I/O
//! - [`page`] - The slotted page format

mod page_file;
pub mod page;

pub use page_file::{PageFileStore, PageStore};
