//! Single-arena buddy bookkeeping
//!
//! Implements the core buddy system over arena-relative offsets: the page
//! metadata table, one free list per order, split-on-allocate and
//! coalesce-on-free. No storage is touched here; see [`crate::BuddyArena`]
//! for the owning wrapper.

use alloc::vec::Vec;

use crate::{is_aligned, AllocError, AllocResult};

#[cfg(feature = "log")]
use log::{debug, info, trace, warn};

use super::{
    buddy_block::{buddy_offset, order_for_size, BuddyBlock},
    free_list::FreeList,
    page_table::{PageMeta, PageTable},
    stats::{BuddyStats, FreeAreaReport, OrderUsage},
};

/// Buddy bookkeeping for one arena of `2^MAX_ORDER` bytes split into
/// `2^MIN_ORDER`-byte pages
///
/// Every byte of the arena belongs to exactly one live block at any time.
/// A block is free iff its head page is linked into the free list of its
/// order; allocated blocks are heads that sit on no list.
pub struct BuddySet<
    const MIN_ORDER: usize = { crate::DEFAULT_MIN_ORDER },
    const MAX_ORDER: usize = { crate::DEFAULT_MAX_ORDER },
> {
    pages: PageTable,
    /// Free lists for each order, slot `order - MIN_ORDER`
    free_lists: Vec<FreeList>,
    live_allocations: usize,
    splits: usize,
    merges: usize,
}

impl<const MIN_ORDER: usize, const MAX_ORDER: usize> BuddySet<MIN_ORDER, MAX_ORDER> {
    const VALID_ORDERS: () = {
        assert!(MIN_ORDER < MAX_ORDER, "MIN_ORDER must be smaller than MAX_ORDER");
        assert!(
            MAX_ORDER < usize::BITS as usize,
            "2^MAX_ORDER must be representable in usize"
        );
    };

    /// Size of the whole arena in bytes
    pub const ARENA_SIZE: usize = 1 << MAX_ORDER;
    /// Size of the smallest block in bytes
    pub const PAGE_SIZE: usize = 1 << MIN_ORDER;
    /// Number of page metadata entries
    pub const PAGE_COUNT: usize = 1 << (MAX_ORDER - MIN_ORDER);

    /// Create a buddy set holding the whole arena as one free block
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_ORDERS;

        let mut set = Self {
            pages: PageTable::new(Self::PAGE_COUNT, MIN_ORDER),
            free_lists: (MIN_ORDER..=MAX_ORDER).map(|_| FreeList::new()).collect(),
            live_allocations: 0,
            splits: 0,
            merges: 0,
        };
        set.init();
        set
    }

    /// Discard all allocations and put the whole arena back as a single
    /// order-`MAX_ORDER` free block headed by page 0
    pub fn init(&mut self) {
        self.pages.reset();
        for list in &mut self.free_lists {
            list.clear();
        }
        self.live_allocations = 0;
        self.splits = 0;
        self.merges = 0;

        self.push_free_block(0, MAX_ORDER);
        trace!(
            "buddy: init arena of {:#x} bytes, {} pages",
            Self::ARENA_SIZE,
            Self::PAGE_COUNT
        );
    }

    pub const fn min_order(&self) -> usize {
        MIN_ORDER
    }

    pub const fn max_order(&self) -> usize {
        MAX_ORDER
    }

    fn free_list(&self, order: usize) -> &FreeList {
        &self.free_lists[order - MIN_ORDER]
    }

    /// Record `order` on page `index` and link it into that order's free list
    fn push_free_block(&mut self, index: usize, order: usize) {
        self.pages[index].order = Some(order as u8);
        self.free_lists[order - MIN_ORDER].push_front(&mut self.pages, index);
    }

    /// Allocate a block of at least `size` bytes and return its arena offset
    ///
    /// The block is the smallest order that holds `size`. Nothing is modified
    /// when the request fails.
    pub fn alloc(&mut self, size: usize) -> AllocResult<usize> {
        let desired_order = match order_for_size(size, MIN_ORDER, MAX_ORDER) {
            Some(order) => order,
            None => {
                warn!(
                    "buddy: request of {} bytes exceeds arena size {:#x}",
                    size,
                    Self::ARENA_SIZE
                );
                return Err(AllocError::SizeTooLarge);
            }
        };

        // Find the smallest order with a free block of the required order or higher
        let source_order = match (desired_order..=MAX_ORDER).find(|&o| !self.free_list(o).is_empty())
        {
            Some(order) => order,
            None => {
                self.print_alloc_failure_stats(size, desired_order);
                return Err(AllocError::OutOfMemory);
            }
        };

        let index = self.free_lists[source_order - MIN_ORDER]
            .pop_front(&mut self.pages)
            .ok_or(AllocError::OutOfMemory)?;
        let offset = self.pages[index].offset();

        // Split down to the desired order, the upper half goes back to the free lists
        let mut order = source_order;
        while order > desired_order {
            order -= 1;
            let buddy = buddy_offset(offset, order);
            self.push_free_block(buddy >> MIN_ORDER, order);
            self.splits += 1;
        }

        self.pages[index].order = Some(desired_order as u8);
        self.live_allocations += 1;

        if source_order > desired_order {
            debug!(
                "buddy: split order {} down to {} for {} bytes at {:#x}",
                source_order, desired_order, size, offset
            );
        }
        Ok(offset)
    }

    /// Return the block at `offset` and merge it with its free buddies
    ///
    /// `offset` must be an outstanding allocation; anything else is rejected
    /// with [`AllocError::InvalidAddress`] before any bookkeeping changes.
    pub fn free(&mut self, offset: usize) -> AllocResult {
        let initial_order = self.allocated_order(offset)?;

        let mut head = offset;
        let mut order = initial_order;
        while order < MAX_ORDER {
            let buddy = buddy_offset(head, order);
            let buddy_index = buddy >> MIN_ORDER;

            // Only a free buddy of exactly this order may be merged
            let buddy_page = &self.pages[buddy_index];
            if !buddy_page.is_free_head() || buddy_page.order() != Some(order) {
                break;
            }

            let unlinked = self.free_lists[order - MIN_ORDER].remove(&mut self.pages, buddy_index);
            debug_assert!(unlinked, "free buddy {:#x} missing from its list", buddy);

            // The upper half stops being a head
            self.pages[head.max(buddy) >> MIN_ORDER].order = None;
            head = head.min(buddy);
            order += 1;
            self.merges += 1;
        }

        self.push_free_block(head >> MIN_ORDER, order);
        self.live_allocations -= 1;

        if order > initial_order {
            debug!(
                "buddy: freed {:#x} (order {}), merged up to order {} at {:#x}",
                offset, initial_order, order, head
            );
        }
        Ok(())
    }

    /// Order of the outstanding allocation at `offset`
    fn allocated_order(&self, offset: usize) -> AllocResult<usize> {
        let order = self
            .pages
            .index_of(offset)
            .map(|index| &self.pages[index])
            .filter(|page| page.is_allocated_head())
            .and_then(PageMeta::order);

        match order {
            Some(order) if is_aligned(offset, 1 << order) => Ok(order),
            _ => {
                warn!("buddy: {:#x} is not an outstanding allocation", offset);
                Err(AllocError::InvalidAddress)
            }
        }
    }

    /// Size in bytes of the block backing the allocation at `offset`
    pub fn allocation_size(&self, offset: usize) -> AllocResult<usize> {
        self.allocated_order(offset).map(|order| 1 << order)
    }

    /// The allocated block starting at `offset`, if there is one
    pub fn allocated_block(&self, offset: usize) -> Option<BuddyBlock> {
        let index = self.pages.index_of(offset)?;
        let page = &self.pages[index];
        if !page.is_allocated_head() {
            return None;
        }
        page.order().map(|order| BuddyBlock::new(order, offset))
    }

    /// Whether `offset` is the start of an outstanding allocation
    pub fn is_allocated(&self, offset: usize) -> bool {
        self.allocated_block(offset).is_some()
    }

    /// Free-list occupancy for every order, lowest first
    pub fn dump(&self) -> FreeAreaReport {
        FreeAreaReport::new(
            (MIN_ORDER..=MAX_ORDER)
                .map(|order| OrderUsage {
                    order,
                    free_blocks: self.free_list(order).len(),
                    block_size: 1 << order,
                })
                .collect(),
        )
    }

    /// Get statistics for this arena
    pub fn stats(&self) -> BuddyStats {
        let free_area = self.dump();
        let free_bytes = free_area.free_bytes();
        BuddyStats {
            total_bytes: Self::ARENA_SIZE,
            free_bytes,
            used_bytes: Self::ARENA_SIZE - free_bytes,
            live_allocations: self.live_allocations,
            splits: self.splits,
            merges: self.merges,
            free_area,
        }
    }

    /// Get the number of free blocks of a specific order
    pub fn get_order_block_count(&self, order: usize) -> usize {
        if (MIN_ORDER..=MAX_ORDER).contains(&order) {
            self.free_list(order).len()
        } else {
            0
        }
    }

    /// Offsets of the free blocks of `order`, in list order
    pub fn free_blocks(&self, order: usize) -> impl Iterator<Item = usize> + '_ {
        let list = (MIN_ORDER..=MAX_ORDER)
            .contains(&order)
            .then(|| self.free_list(order).iter(&self.pages));
        list.into_iter()
            .flatten()
            .map(move |index| self.pages[index].offset())
    }

    /// Metadata of page `index`
    pub fn page(&self, index: usize) -> Option<&PageMeta> {
        self.pages.get(index)
    }

    /// Number of blocks handed out and not yet freed
    pub fn live_allocations(&self) -> usize {
        self.live_allocations
    }

    /// Print the free block distribution
    pub fn print_free_areas(&self) {
        info!("========== Buddy Arena Free Areas ==========");
        info!(
            "Arena size: {:#x}, page size: {:#x}",
            Self::ARENA_SIZE,
            Self::PAGE_SIZE
        );
        for usage in self.dump().orders() {
            if usage.free_blocks > 0 {
                info!(
                    "  Order {}: {} blocks (size {} bytes each, total {:#x})",
                    usage.order,
                    usage.free_blocks,
                    usage.block_size,
                    usage.free_bytes()
                );
            }
        }
        info!("Live allocations: {}", self.live_allocations);
        info!("============================================");
    }

    #[cfg(feature = "tracking")]
    fn print_alloc_failure_stats(&self, size: usize, desired_order: usize) {
        super::stats::MemoryStatsReporter::print_alloc_failure_stats(
            &self.stats(),
            size,
            desired_order,
        );
    }

    #[cfg(not(feature = "tracking"))]
    fn print_alloc_failure_stats(&self, _size: usize, _desired_order: usize) {
        debug!(
            "buddy: out of memory for {} bytes (order {})",
            _size, _desired_order
        );
    }
}

impl<const MIN_ORDER: usize, const MAX_ORDER: usize> Default for BuddySet<MIN_ORDER, MAX_ORDER> {
    fn default() -> Self {
        Self::new()
    }
}
