//! Shared buddy arena behind a single spin lock.
//!
//! The whole bookkeeping of one arena is guarded by one lock; alloc and free
//! are O(log N), so contention stays short. Bytes written into a block are
//! the caller's to synchronize.

use core::ops::DerefMut;

use kspin::SpinNoIrq;

use crate::arena::BuddyArena;
use crate::buddy::{BuddyStats, FreeAreaReport};
use crate::{AllocError, AllocResult};

#[cfg(feature = "log")]
use log::{error, warn};

/// Buddy arena that can be shared between threads or placed in a `static`
pub struct LockedBuddyArena<
    const MIN_ORDER: usize = { crate::DEFAULT_MIN_ORDER },
    const MAX_ORDER: usize = { crate::DEFAULT_MAX_ORDER },
> {
    inner: SpinNoIrq<Option<BuddyArena<MIN_ORDER, MAX_ORDER>>>,
}

impl<const MIN_ORDER: usize, const MAX_ORDER: usize> LockedBuddyArena<MIN_ORDER, MAX_ORDER> {
    /// Create an empty handle; storage is allocated by [`init`](Self::init)
    pub const fn new() -> Self {
        Self {
            inner: SpinNoIrq::new(None),
        }
    }

    /// Build the arena, or reset it if it already exists
    ///
    /// Resetting discards every outstanding allocation.
    pub fn init(&self) {
        let mut inner = self.inner.lock();
        match inner.as_mut() {
            Some(arena) => arena.init(),
            None => *inner = Some(BuddyArena::new()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Allocate a block of at least `size` bytes, returning its offset
    pub fn alloc(&self, size: usize) -> AllocResult<usize> {
        match self.inner.lock().as_mut() {
            Some(arena) => arena.alloc(size),
            None => {
                error!("locked arena: Allocator not initialized");
                Err(AllocError::OutOfMemory)
            }
        }
    }

    /// Free the allocation starting at `offset`
    pub fn free(&self, offset: usize) -> AllocResult {
        match self.inner.lock().as_mut() {
            Some(arena) => arena.free(offset),
            None => {
                warn!("locked arena: Deallocating {:#x} before initializing", offset);
                Err(AllocError::InvalidAddress)
            }
        }
    }

    /// Free-list occupancy for every order, `None` before `init`
    pub fn dump(&self) -> Option<FreeAreaReport> {
        self.inner.lock().as_ref().map(BuddyArena::dump)
    }

    /// Get memory statistics, `None` before `init`
    pub fn stats(&self) -> Option<BuddyStats> {
        self.inner.lock().as_ref().map(BuddyArena::stats)
    }

    /// Size of the block backing the allocation at `offset`
    pub fn allocation_size(&self, offset: usize) -> AllocResult<usize> {
        self.inner
            .lock()
            .as_ref()
            .ok_or(AllocError::InvalidAddress)
            .and_then(|arena| arena.allocation_size(offset))
    }

    /// Hold the lock to reach block contents or run several operations at once
    pub fn lock(&self) -> impl DerefMut<Target = Option<BuddyArena<MIN_ORDER, MAX_ORDER>>> + '_ {
        self.inner.lock()
    }
}

impl<const MIN_ORDER: usize, const MAX_ORDER: usize> Default
    for LockedBuddyArena<MIN_ORDER, MAX_ORDER>
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized() {
        let arena = LockedBuddyArena::<12, 14>::new();
        assert!(!arena.is_initialized());
        assert_eq!(arena.alloc(1), Err(AllocError::OutOfMemory));
        assert_eq!(arena.free(0), Err(AllocError::InvalidAddress));
        assert!(arena.dump().is_none());
        assert!(arena.stats().is_none());
    }

    #[test]
    fn test_init_and_reset() {
        let arena = LockedBuddyArena::<12, 14>::new();
        arena.init();
        let a = arena.alloc(4096).unwrap();
        assert_eq!(arena.allocation_size(a), Ok(4096));
        assert_eq!(arena.stats().unwrap().live_allocations, 1);

        arena.init();
        assert_eq!(arena.stats().unwrap().live_allocations, 0);
        assert_eq!(arena.dump().unwrap().free_blocks(14), 1);
        assert_eq!(arena.free(a), Err(AllocError::InvalidAddress));
    }

    #[test]
    fn test_lock_exposes_blocks() {
        let arena = LockedBuddyArena::<12, 14>::new();
        arena.init();
        let a = arena.alloc(16).unwrap();
        {
            let mut guard = arena.lock();
            let inner = guard.as_mut().unwrap();
            inner.block_mut(a).unwrap()[..4].copy_from_slice(&b"buddy"[..4]);
        }
        let guard = arena.lock();
        assert_eq!(&guard.as_ref().unwrap().block(a).unwrap()[..4], b"budd");
    }
}
