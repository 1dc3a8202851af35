//! Page types and layout.
//!
//! This module contains:
//! - [`Page`] - The 8KB slotted data container
//! - [`PageHeader`] - Metadata at the start of every page
//! - [`SlotEntry`] - One entry of the slot directory

#[allow(clippy::module_inception)]
mod page;
mod page_header;

pub use page::Page;
pub use page_header::{PageHeader, SlotEntry};
