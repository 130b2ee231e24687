//! Owned buddy arena
//!
//! Couples the arena storage with its [`BuddySet`] bookkeeping, so callers
//! get offsets from `alloc` and can reach the bytes behind them.

use alloc::boxed::Box;
use alloc::vec;

use crate::buddy::{BuddySet, BuddyStats, FreeAreaReport};
use crate::AllocResult;

/// A fixed arena of `2^MAX_ORDER` bytes managed by the buddy system
///
/// Addresses handed out are byte offsets relative to the arena base. Several
/// arenas can coexist; none of them share state.
pub struct BuddyArena<
    const MIN_ORDER: usize = { crate::DEFAULT_MIN_ORDER },
    const MAX_ORDER: usize = { crate::DEFAULT_MAX_ORDER },
> {
    storage: Box<[u8]>,
    set: BuddySet<MIN_ORDER, MAX_ORDER>,
}

impl<const MIN_ORDER: usize, const MAX_ORDER: usize> BuddyArena<MIN_ORDER, MAX_ORDER> {
    /// Size of the arena in bytes
    pub const ARENA_SIZE: usize = BuddySet::<MIN_ORDER, MAX_ORDER>::ARENA_SIZE;
    /// Size of the smallest block in bytes
    pub const PAGE_SIZE: usize = BuddySet::<MIN_ORDER, MAX_ORDER>::PAGE_SIZE;

    /// Allocate zeroed storage and initialize the bookkeeping
    pub fn new() -> Self {
        let set = BuddySet::new();
        Self {
            storage: vec![0u8; Self::ARENA_SIZE].into_boxed_slice(),
            set,
        }
    }

    /// Discard every allocation; the whole arena becomes one free block
    ///
    /// Storage contents are left as they are.
    pub fn init(&mut self) {
        self.set.init();
    }

    /// Allocate a block of at least `size` bytes, returning its offset
    pub fn alloc(&mut self, size: usize) -> AllocResult<usize> {
        self.set.alloc(size)
    }

    /// Free the allocation starting at `offset`
    pub fn free(&mut self, offset: usize) -> AllocResult {
        self.set.free(offset)
    }

    /// Free-list occupancy for every order
    pub fn dump(&self) -> FreeAreaReport {
        self.set.dump()
    }

    pub fn stats(&self) -> BuddyStats {
        self.set.stats()
    }

    /// Size of the block backing the allocation at `offset`
    pub fn allocation_size(&self, offset: usize) -> AllocResult<usize> {
        self.set.allocation_size(offset)
    }

    /// Bytes of the allocation starting at `offset`
    pub fn block(&self, offset: usize) -> Option<&[u8]> {
        let block = self.set.allocated_block(offset)?;
        self.storage.get(block.offset..block.end())
    }

    /// Mutable bytes of the allocation starting at `offset`
    pub fn block_mut(&mut self, offset: usize) -> Option<&mut [u8]> {
        let block = self.set.allocated_block(offset)?;
        self.storage.get_mut(block.offset..block.end())
    }

    /// The bookkeeping behind this arena
    pub fn buddy_set(&self) -> &BuddySet<MIN_ORDER, MAX_ORDER> {
        &self.set
    }

    /// Returns total memory size in bytes.
    pub fn total_bytes(&self) -> usize {
        Self::ARENA_SIZE
    }

    /// Returns allocated memory size in bytes, rounded up to block sizes.
    pub fn used_bytes(&self) -> usize {
        Self::ARENA_SIZE - self.available_bytes()
    }

    /// Returns available memory size in bytes.
    pub fn available_bytes(&self) -> usize {
        self.set.dump().free_bytes()
    }

    /// Log the free block distribution
    pub fn print_free_areas(&self) {
        self.set.print_free_areas();
    }
}

impl<const MIN_ORDER: usize, const MAX_ORDER: usize> Default for BuddyArena<MIN_ORDER, MAX_ORDER> {
    fn default() -> Self {
        Self::new()
    }
}
