//! Buddy system core
//!
//! This module provides the buddy bookkeeping for a single fixed arena:
//! - Page metadata table addressed by page index
//! - Intrusive per-order free lists
//! - Split-on-allocate, coalesce-on-free
//! - Free-area statistics and reporting

pub mod buddy_block;
pub mod buddy_set;
pub mod free_list;
pub mod page_table;
pub mod stats;

pub use buddy_block::{buddy_offset, order_for_size, BuddyBlock};
pub use buddy_set::BuddySet;
pub use free_list::{FreeList, FreeListIter};
pub use page_table::{FreeLink, PageMeta, PageTable};
pub use stats::{BuddyStats, FreeAreaReport, MemoryStatsReporter, OrderUsage};
