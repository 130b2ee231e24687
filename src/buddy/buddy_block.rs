//! Buddy block metadata
//!
//! Represents a block of the arena by its order and arena-relative offset,
//! plus the pure order/offset arithmetic the buddy system is built on.

use core::cmp::PartialOrd;

/// Buddy block metadata
#[derive(Debug, Clone, Copy)]
pub struct BuddyBlock {
    pub order: usize,
    pub offset: usize,
}

impl BuddyBlock {
    /// Create a new buddy block
    pub const fn new(order: usize, offset: usize) -> Self {
        Self { order, offset }
    }

    /// Size of the block in bytes
    pub const fn size(&self) -> usize {
        1 << self.order
    }

    /// Offset one past the last byte of the block
    pub const fn end(&self) -> usize {
        self.offset + self.size()
    }

    /// The other half of the parent block at the next higher order
    pub const fn buddy(&self) -> Self {
        Self::new(self.order, buddy_offset(self.offset, self.order))
    }

    /// Whether the two blocks share at least one byte
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

impl PartialOrd for BuddyBlock {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BuddyBlock {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        (self.offset, self.order).cmp(&(other.offset, other.order))
    }
}

impl PartialEq for BuddyBlock {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.order == other.order
    }
}

impl Eq for BuddyBlock {}

/// Offset of the buddy of the order-`order` block starting at `offset`.
///
/// Two order-`k` blocks composing one order-`k + 1` block differ only in bit
/// `k` of their offset from the arena base. `offset` must be aligned to
/// `2^order`.
#[inline]
pub const fn buddy_offset(offset: usize, order: usize) -> usize {
    offset ^ (1 << order)
}

/// Smallest order in `[min_order, max_order]` whose block holds `size` bytes.
///
/// Returns `None` when `size` exceeds `2^max_order`, or when the orders do not
/// satisfy `min_order <= max_order < usize::BITS`. A zero-byte request is
/// served by a `min_order` block.
pub const fn order_for_size(size: usize, min_order: usize, max_order: usize) -> Option<usize> {
    if min_order > max_order || max_order >= usize::BITS as usize {
        return None;
    }
    if size <= (1 << min_order) {
        return Some(min_order);
    }
    // ceil(log2(size)) for size >= 2
    let order = (usize::BITS - (size - 1).leading_zeros()) as usize;
    if order > max_order {
        None
    } else {
        Some(order)
    }
}
