//! Fixed-Arena Buddy Allocator
//!
//! This crate manages a single contiguous byte arena of `2^MAX_ORDER` bytes by
//! recursively halving and merging power-of-two blocks, featuring:
//! - Page metadata table indexed by minimum-sized page
//! - Intrusive doubly-linked free list per order
//! - Split-on-allocate and buddy coalescing on free
//! - Optional spin-locked wrapper for shared arenas

#![no_std]

extern crate alloc;

use core::fmt;

// Logging support - conditionally import log crate
#[cfg(feature = "log")]
extern crate log;

// Stub macros when log is disabled - these become no-ops
#[cfg(not(feature = "log"))]
#[allow(unused_macros)]
macro_rules! error {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
#[allow(unused_macros)]
macro_rules! warn {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
#[allow(unused_macros)]
macro_rules! info {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {};
}
#[cfg(not(feature = "log"))]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// Default minimum order: 4KB pages
pub const DEFAULT_MIN_ORDER: usize = 12;

/// Default maximum order: 1MB arena
pub const DEFAULT_MAX_ORDER: usize = 20;

/// The error type used for allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The request exceeds the whole arena.
    SizeTooLarge,
    /// No free block of a sufficient order is left.
    OutOfMemory,
    /// `free` was given an offset that is not an outstanding allocation.
    InvalidAddress,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::SizeTooLarge => f.write_str("requested size exceeds arena capacity"),
            AllocError::OutOfMemory => f.write_str("no free block large enough"),
            AllocError::InvalidAddress => f.write_str("offset is not an outstanding allocation"),
        }
    }
}

/// A [`Result`] type with [`AllocError`] as the error type.
pub type AllocResult<T = ()> = Result<T, AllocError>;

/// Checks whether the offset has the demanded alignment.
///
/// Equivalent to `offset % align == 0`, but the alignment must be a power of two.
#[inline]
const fn is_aligned(offset: usize, align: usize) -> bool {
    offset & (align - 1) == 0
}

pub mod buddy;
pub use buddy::{buddy_offset, order_for_size, BuddyBlock, BuddySet, PageMeta};
pub use buddy::{BuddyStats, FreeAreaReport, OrderUsage};

pub mod arena;
pub use arena::BuddyArena;

pub mod locked;
pub use locked::LockedBuddyArena;
