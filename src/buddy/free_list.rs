//! Intrusive free list threaded through the page metadata table
//!
//! Each list only stores its head and length; the `prev`/`next` links live
//! in the [`PageMeta`](super::PageMeta) entries themselves. Membership in a
//! list is what marks a block as free.

#[cfg(feature = "log")]
use log::error;

use super::page_table::{FreeLink, PageTable};

/// Doubly-linked free list of block heads for one order
///
/// Blocks are pushed and popped at the head, so the most recently freed
/// block of an order is the next one handed out.
#[derive(Debug, Default)]
pub struct FreeList {
    head: Option<usize>,
    len: usize,
}

impl FreeList {
    /// Create a new empty free list
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Get the length of the list
    pub fn len(&self) -> usize {
        self.len
    }

    /// Page index at the head of the list
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    /// Link page `index` in at the head of the list
    ///
    /// The page must not be on any list already.
    pub fn push_front(&mut self, table: &mut PageTable, index: usize) {
        debug_assert!(table[index].link.is_none(), "page {} already linked", index);

        if let Some(old_head) = self.head {
            if let Some(link) = table[old_head].link.as_mut() {
                link.prev = Some(index);
            }
        }
        table[index].link = Some(FreeLink {
            prev: None,
            next: self.head,
        });
        self.head = Some(index);
        self.len += 1;
    }

    /// Unlink and return the head of the list
    pub fn pop_front(&mut self, table: &mut PageTable) -> Option<usize> {
        let head = self.head?;
        if self.remove(table, head) {
            Some(head)
        } else {
            None
        }
    }

    /// Unlink page `index` from the list in O(1)
    ///
    /// Returns `false` when the page is not linked.
    pub fn remove(&mut self, table: &mut PageTable, index: usize) -> bool {
        let link = match table.get_mut(index).and_then(|page| page.link.take()) {
            Some(link) => link,
            None => {
                error!("page {} is not on a free list", index);
                return false;
            }
        };

        match link.prev {
            Some(prev) => {
                if let Some(prev_link) = table[prev].link.as_mut() {
                    prev_link.next = link.next;
                }
            }
            None => self.head = link.next,
        }
        if let Some(next) = link.next {
            if let Some(next_link) = table[next].link.as_mut() {
                next_link.prev = link.prev;
            }
        }

        self.len -= 1;
        true
    }

    /// Get iterator over the page indices on the list
    pub fn iter<'a>(&self, table: &'a PageTable) -> FreeListIter<'a> {
        FreeListIter {
            table,
            current: self.head,
        }
    }

    /// Forget every entry; the caller resets the page links
    pub fn clear(&mut self) {
        self.head = None;
        self.len = 0;
    }
}

/// Iterator for FreeList
pub struct FreeListIter<'a> {
    table: &'a PageTable,
    current: Option<usize>,
}

impl<'a> Iterator for FreeListIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        self.current = self
            .table
            .get(index)
            .and_then(|page| page.link)
            .and_then(|link| link.next);
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    const TEST_PAGE_COUNT: usize = 8;

    #[test]
    fn test_free_list_basic() {
        let mut table = PageTable::new(TEST_PAGE_COUNT, 12);
        let mut list = FreeList::new();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);

        list.push_front(&mut table, 1);
        list.push_front(&mut table, 2);
        list.push_front(&mut table, 3);

        assert_eq!(list.len(), 3);
        assert!(table[2].link.is_some());

        // LIFO
        assert_eq!(list.pop_front(&mut table), Some(3));
        assert_eq!(list.pop_front(&mut table), Some(2));
        assert_eq!(list.len(), 1);
        assert!(table[3].link.is_none());

        assert_eq!(list.pop_front(&mut table), Some(1));
        assert_eq!(list.pop_front(&mut table), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_remove_middle_head_and_tail() {
        let mut table = PageTable::new(TEST_PAGE_COUNT, 12);
        let mut list = FreeList::new();

        for index in [0, 2, 4, 6] {
            list.push_front(&mut table, index);
        }
        let items: Vec<_> = list.iter(&table).collect();
        assert_eq!(items, [6, 4, 2, 0]);

        assert!(list.remove(&mut table, 4));
        let items: Vec<_> = list.iter(&table).collect();
        assert_eq!(items, [6, 2, 0]);

        assert!(list.remove(&mut table, 6));
        assert_eq!(list.head(), Some(2));
        assert_eq!(table[2].link.and_then(|l| l.prev), None);

        assert!(list.remove(&mut table, 0));
        let items: Vec<_> = list.iter(&table).collect();
        assert_eq!(items, [2]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_unlinked_page() {
        let mut table = PageTable::new(TEST_PAGE_COUNT, 12);
        let mut list = FreeList::new();
        list.push_front(&mut table, 1);

        assert!(!list.remove(&mut table, 5));
        assert!(!list.remove(&mut table, TEST_PAGE_COUNT + 3));
        assert_eq!(list.len(), 1);
    }
}
