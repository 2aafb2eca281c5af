use std::collections::{BTreeSet, HashMap};

use crate::common::types::PageId;

/// Ordered page-recency index backing LRU victim selection. Ticks come from
/// the pool's monotonic counter, so no two entries ever tie.
#[derive(Debug, Default)]
pub(crate) struct LruIndex {
    by_tick: BTreeSet<(u64, PageId)>,
    tick_of: HashMap<PageId, u64>,
}

impl LruIndex {
    /// Record an access, moving the page to the most-recent position.
    pub fn touch(&mut self, pid: PageId, tick: u64) {
        if let Some(old) = self.tick_of.insert(pid, tick) {
            self.by_tick.remove(&(old, pid));
        }
        self.by_tick.insert((tick, pid));
    }

    pub fn remove(&mut self, pid: PageId) {
        if let Some(tick) = self.tick_of.remove(&pid) {
            self.by_tick.remove(&(tick, pid));
        }
    }

    /// Pages from least to most recently used.
    pub fn oldest_first(&self) -> impl Iterator<Item = PageId> + '_ {
        self.by_tick.iter().map(|&(_, pid)| pid)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.by_tick.len(), self.tick_of.len());
        self.by_tick.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_reorders_and_never_duplicates() {
        let mut lru = LruIndex::default();
        let (p1, p2) = (PageId::new(1, 1), PageId::new(1, 2));

        lru.touch(p1, 1);
        lru.touch(p2, 2);
        assert_eq!(lru.oldest_first().collect::<Vec<_>>(), vec![p1, p2]);

        lru.touch(p1, 3);
        assert_eq!(lru.oldest_first().collect::<Vec<_>>(), vec![p2, p1]);
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_remove_forgets_the_page() {
        let mut lru = LruIndex::default();
        let p1 = PageId::new(1, 1);
        lru.touch(p1, 1);
        lru.remove(p1);
        assert_eq!(lru.len(), 0);
        lru.remove(p1); // idempotent
        assert_eq!(lru.len(), 0);
    }
}
