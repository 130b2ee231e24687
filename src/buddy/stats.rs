//! Statistics and debugging for the buddy arena
//!
//! Provides the per-order free-area report, aggregate statistics and
//! failure reporting.

use alloc::vec::Vec;
use core::fmt;

/// Free blocks of one order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderUsage {
    pub order: usize,
    pub free_blocks: usize,
    pub block_size: usize,
}

impl OrderUsage {
    /// Bytes held by the free blocks of this order
    pub const fn free_bytes(&self) -> usize {
        self.free_blocks * self.block_size
    }
}

/// Free-list occupancy from `MIN_ORDER` to `MAX_ORDER`, ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeAreaReport {
    orders: Vec<OrderUsage>,
}

impl FreeAreaReport {
    pub(crate) fn new(orders: Vec<OrderUsage>) -> Self {
        Self { orders }
    }

    /// Per-order entries, lowest order first
    pub fn orders(&self) -> &[OrderUsage] {
        &self.orders
    }

    /// `(order, free_block_count)` pairs, lowest order first
    pub fn counts(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.orders.iter().map(|u| (u.order, u.free_blocks))
    }

    /// Free block count for `order`, zero for orders outside the arena
    pub fn free_blocks(&self, order: usize) -> usize {
        self.orders
            .iter()
            .find(|u| u.order == order)
            .map_or(0, |u| u.free_blocks)
    }

    /// Total bytes on all free lists
    pub fn free_bytes(&self) -> usize {
        self.orders.iter().map(OrderUsage::free_bytes).sum()
    }
}

impl fmt::Display for FreeAreaReport {
    /// One `count:sizeK` field per order, e.g. `1:4K 0:8K 1:16K `
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for usage in &self.orders {
            write!(f, "{}:{}K ", usage.free_blocks, usage.block_size / 1024)?;
        }
        Ok(())
    }
}

/// Buddy arena statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuddyStats {
    pub total_bytes: usize,
    pub free_bytes: usize,
    pub used_bytes: usize,
    /// Blocks handed out and not yet freed
    pub live_allocations: usize,
    /// Cumulative block halvings since the last `init`
    pub splits: usize,
    /// Cumulative buddy merges since the last `init`
    pub merges: usize,
    pub free_area: FreeAreaReport,
}

/// Detailed memory statistics reporter
pub struct MemoryStatsReporter;

impl MemoryStatsReporter {
    /// Print detailed allocation failure statistics
    /// This is a standalone function to keep allocation logic clean
    #[allow(unused_variables)]
    pub fn print_alloc_failure_stats(stats: &BuddyStats, request_size: usize, desired_order: usize) {
        #[cfg(feature = "log")]
        use log::error;
        error!("========================================");
        error!(
            "Request: {} bytes (order {}, {} KB block)",
            request_size,
            desired_order,
            (1usize << desired_order) / 1024
        );
        error!(
            "  Arena: {} KB total, {} KB free, {} KB used",
            stats.total_bytes / 1024,
            stats.free_bytes / 1024,
            stats.used_bytes / 1024
        );
        error!("  Live allocations: {}", stats.live_allocations);
        error!("  Free blocks by order:");

        for usage in stats.free_area.orders().iter().rev() {
            if usage.free_blocks > 0 {
                error!(
                    "    Order {}: {} blocks ({} KB each, {} KB total)",
                    usage.order,
                    usage.free_blocks,
                    usage.block_size / 1024,
                    usage.free_bytes() / 1024
                );
            }
        }
        error!("========================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    fn sample() -> FreeAreaReport {
        FreeAreaReport::new(vec![
            OrderUsage {
                order: 12,
                free_blocks: 1,
                block_size: 4096,
            },
            OrderUsage {
                order: 13,
                free_blocks: 0,
                block_size: 8192,
            },
            OrderUsage {
                order: 14,
                free_blocks: 1,
                block_size: 16384,
            },
        ])
    }

    #[test]
    fn test_report_display() {
        assert_eq!(sample().to_string(), "1:4K 0:8K 1:16K ");
    }

    #[test]
    fn test_report_queries() {
        let report = sample();
        assert_eq!(report.free_bytes(), 4096 + 16384);
        assert_eq!(report.free_blocks(12), 1);
        assert_eq!(report.free_blocks(13), 0);
        assert_eq!(report.free_blocks(30), 0);
        let counts: Vec<_> = report.counts().collect();
        assert_eq!(counts, [(12, 1), (13, 0), (14, 1)]);
    }
}
