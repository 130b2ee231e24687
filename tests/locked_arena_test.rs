//! Tests for LockedBuddyArena shared between threads

#![no_std]

extern crate alloc;
extern crate std;

use alloc::vec::Vec;
use buddy_arena::{AllocError, LockedBuddyArena};
use std::thread;

const THREADS: usize = 8;
const ROUNDS: usize = 200;

static SHARED: LockedBuddyArena<12, 22> = LockedBuddyArena::new();

#[test]
fn test_static_arena_concurrent_alloc_free() {
    SHARED.init();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            thread::spawn(move || {
                let mut held = Vec::new();
                for round in 0..ROUNDS {
                    let size = 1 + ((t * 7919 + round * 104_729) % (1 << 15));
                    match SHARED.alloc(size) {
                        Ok(offset) => {
                            // Stamp the block so aliasing would show up below
                            let mut guard = SHARED.lock();
                            let arena = guard.as_mut().unwrap();
                            arena.block_mut(offset).unwrap().fill(t as u8);
                            held.push(offset);
                        }
                        Err(err) => assert_eq!(err, AllocError::OutOfMemory),
                    }
                    if round % 3 == 2 {
                        if let Some(offset) = held.pop() {
                            let guard = SHARED.lock();
                            let arena = guard.as_ref().unwrap();
                            assert!(arena.block(offset).unwrap().iter().all(|&b| b == t as u8));
                            drop(guard);
                            SHARED.free(offset).unwrap();
                        }
                    }
                }
                held
            })
        })
        .collect();

    let mut all: Vec<usize> = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    let stats = SHARED.stats().unwrap();
    assert_eq!(stats.live_allocations, all.len());

    let used: usize = all
        .iter()
        .map(|&offset| SHARED.allocation_size(offset).unwrap())
        .sum();
    assert_eq!(used + stats.free_bytes, stats.total_bytes);

    for offset in all {
        SHARED.free(offset).unwrap();
    }
    let dump = SHARED.dump().unwrap();
    assert_eq!(dump.free_blocks(22), 1);
    assert_eq!(dump.free_bytes(), 1 << 22);
}
