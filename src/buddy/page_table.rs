//! Page metadata table for the buddy arena
//!
//! Holds one entry per minimum-sized page. Entries are addressed by page
//! index, which doubles as the link value for the intrusive free lists, so
//! no raw pointers are involved.

use alloc::vec::Vec;

/// Intrusive free-list link, present only while the page heads a free block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeLink {
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

impl FreeLink {
    pub const fn detached() -> Self {
        Self {
            prev: None,
            next: None,
        }
    }
}

/// Bookkeeping for one minimum-sized page
#[derive(Debug, Clone, Copy)]
pub struct PageMeta {
    index: usize,
    offset: usize,
    /// Order of the block this page heads; `None` for interior pages
    pub(super) order: Option<u8>,
    pub(super) link: Option<FreeLink>,
}

impl PageMeta {
    const fn new(index: usize, page_shift: usize) -> Self {
        Self {
            index,
            offset: index << page_shift,
            order: None,
            link: None,
        }
    }

    /// Position among the arena's pages
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Arena-relative byte offset of the page
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Order of the block headed by this page, if it heads one
    pub fn order(&self) -> Option<usize> {
        self.order.map(usize::from)
    }

    /// Whether this page heads a block sitting on a free list
    pub const fn is_free_head(&self) -> bool {
        self.order.is_some() && self.link.is_some()
    }

    /// Whether this page heads a block handed out by `alloc`
    pub const fn is_allocated_head(&self) -> bool {
        self.order.is_some() && self.link.is_none()
    }

    fn clear(&mut self) {
        self.order = None;
        self.link = None;
    }
}

/// Page metadata table - one entry per minimum-sized page of the arena
pub struct PageTable {
    pages: Vec<PageMeta>,
    page_shift: usize,
}

impl PageTable {
    /// Create a table covering `page_count` pages of `1 << page_shift` bytes
    pub fn new(page_count: usize, page_shift: usize) -> Self {
        let pages = (0..page_count)
            .map(|index| PageMeta::new(index, page_shift))
            .collect();
        Self { pages, page_shift }
    }

    /// Mark every page as "not a head" and detach all links
    pub fn reset(&mut self) {
        for page in &mut self.pages {
            page.clear();
        }
    }

    /// Number of pages covered by the table
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page index for an arena offset, if it lies inside the arena on a page boundary
    pub fn index_of(&self, offset: usize) -> Option<usize> {
        if !crate::is_aligned(offset, 1 << self.page_shift) {
            return None;
        }
        let index = offset >> self.page_shift;
        (index < self.pages.len()).then_some(index)
    }

    /// Get a reference to a page by index
    pub fn get(&self, index: usize) -> Option<&PageMeta> {
        self.pages.get(index)
    }

    /// Get a mutable reference to a page by index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut PageMeta> {
        self.pages.get_mut(index)
    }

    /// Iterate over every page entry
    pub fn iter(&self) -> core::slice::Iter<'_, PageMeta> {
        self.pages.iter()
    }
}

impl core::ops::Index<usize> for PageTable {
    type Output = PageMeta;

    fn index(&self, index: usize) -> &PageMeta {
        &self.pages[index]
    }
}

impl core::ops::IndexMut<usize> for PageTable {
    fn index_mut(&mut self, index: usize) -> &mut PageMeta {
        &mut self.pages[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_init() {
        let table = PageTable::new(4, 12);
        assert_eq!(table.len(), 4);
        for (i, page) in table.iter().enumerate() {
            assert_eq!(page.index(), i);
            assert_eq!(page.offset(), i * 0x1000);
            assert_eq!(page.order(), None);
            assert!(!page.is_free_head());
            assert!(!page.is_allocated_head());
        }
    }

    #[test]
    fn test_index_of() {
        let table = PageTable::new(4, 12);
        assert_eq!(table.index_of(0), Some(0));
        assert_eq!(table.index_of(0x3000), Some(3));
        assert_eq!(table.index_of(0x4000), None);
        assert_eq!(table.index_of(0x1800), None);
        assert_eq!(table.index_of(usize::MAX), None);
    }

    #[test]
    fn test_reset_clears_heads() {
        let mut table = PageTable::new(4, 12);
        table[0].order = Some(14);
        table[0].link = Some(FreeLink::detached());
        table[2].order = Some(13);
        assert!(table[0].is_free_head());
        assert!(table[2].is_allocated_head());

        table.reset();
        assert!(table.iter().all(|page| page.order().is_none()));
        assert!(table.iter().all(|page| !page.is_free_head()));
    }
}
