use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::common::types::{PageId, PagePtr, TableId, TransactionId};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::lru::LruIndex;
use crate::storage::disk::PageStore;
use crate::storage::heap::HeapFile;
use crate::transaction::concurrency::{LockManager, LockMode};
use crate::tuple::{RecordId, Tuple};

/// Default number of pages a buffer pool caches.
pub const DEFAULT_CAPACITY: usize = 50;

/// Bounded page cache mediating every page access under two-phase locking.
/// Holds the single in-memory copy of each resident page, evicts clean pages
/// LRU-first (NO-STEAL), flushes a transaction's pages on commit (FORCE) and
/// drops its dirty pages on abort.
pub struct BufferPool {
    capacity: usize,
    state: Mutex<PoolState>,
    /// Monotonic access clock; never wall time, so recency can't tie or run
    /// backwards.
    clock: AtomicU64,
    locks: LockManager,
    files: RwLock<HashMap<TableId, Arc<HeapFile>>>,
}

/// Page map and recency index, mutated together under one mutex. No I/O
/// happens while this mutex is held.
#[derive(Default)]
struct PoolState {
    pages: HashMap<PageId, PagePtr>,
    lru: LruIndex,
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(PoolState::default()),
            clock: AtomicU64::new(1),
            locks: LockManager::new(),
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Make a heap file reachable through this pool. Page misses for the
    /// file's table read through its store, and `insert_tuple` /
    /// `delete_tuple` dispatch to it.
    pub fn register_file(&self, file: Arc<HeapFile>) {
        self.files.write().insert(file.table_id(), file);
    }

    pub fn file(&self, table_id: TableId) -> Result<Arc<HeapFile>, BufferPoolError> {
        self.files
            .read()
            .get(&table_id)
            .cloned()
            .ok_or(BufferPoolError::UnknownTable(table_id))
    }

    fn store_for(&self, table_id: TableId) -> Result<Arc<PageStore>, BufferPoolError> {
        Ok(self.file(table_id)?.store())
    }

    fn next_tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Acquire the named lock, then return the page, fetching it from disk
    /// on miss. Blocks until the lock is granted; fails with
    /// `TransactionAborted` when the wait would deadlock, in which case the
    /// caller must finalize with `transaction_complete(tid, false)`.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        mode: LockMode,
    ) -> Result<PagePtr, BufferPoolError> {
        self.locks.acquire(tid, pid, mode)?;

        {
            let mut state = self.state.lock();
            if let Some(page) = state.pages.get(&pid) {
                let page = page.clone();
                let tick = self.next_tick();
                state.lru.touch(pid, tick);
                return Ok(page);
            }
        }

        debug!("page {} missed the pool, fetching from disk", pid);
        let store = self.store_for(pid.table_id)?;
        let page = Arc::new(RwLock::new(store.read_page(pid)?));
        self.insert_page(pid, page)
    }

    /// Unilateral lock release. Violates two-phase locking; only callers
    /// that understand the risk (e.g. a narrowly scoped internal scan) may
    /// use it.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        self.locks.release(tid, pid);
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.locks.holds(tid, pid)
    }

    /// Whether the page is currently resident. Mainly for tests and
    /// invariant checks.
    pub fn contains_page(&self, pid: PageId) -> bool {
        self.state.lock().pages.contains_key(&pid)
    }

    /// Finalize a transaction. Commit flushes every page the transaction
    /// holds any lock on (FORCE); abort drops its dirty pages from the pool
    /// without writing. Either way all of its locks and pending requests are
    /// released.
    pub fn transaction_complete(
        &self,
        tid: TransactionId,
        commit: bool,
    ) -> Result<(), BufferPoolError> {
        debug!("{} finalizing, commit={}", tid, commit);
        if commit {
            for pid in self.locks.pages_of(tid) {
                self.flush_page(pid)?;
            }
        } else {
            let mut state = self.state.lock();
            let PoolState { pages, lru } = &mut *state;
            for pid in self.locks.pages_of(tid) {
                let dirtied_by_tid = pages
                    .get(&pid)
                    .map_or(false, |p| p.read().dirty_by == Some(tid));
                if dirtied_by_tid {
                    pages.remove(&pid);
                    lru.remove(pid);
                }
            }
        }

        self.locks.release_all(tid);
        Ok(())
    }

    /// Add a tuple to the table on behalf of `tid`. Every page the access
    /// method modifies is marked dirty and re-asserted into the pool.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: TableId,
        tuple: &mut Tuple,
    ) -> Result<RecordId, BufferPoolError> {
        let file = self.file(table_id)?;
        let (rid, modified) = file.insert_tuple(tid, self, tuple)?;
        self.assert_dirty(tid, modified)?;
        Ok(rid)
    }

    /// Remove the tuple named by its record id.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<(), BufferPoolError> {
        let rid = tuple.record_id().ok_or_else(|| {
            BufferPoolError::InvalidOperation("tuple has no record id".to_string())
        })?;
        let file = self.file(rid.page_id.table_id)?;
        let modified = file.delete_tuple(tid, self, tuple)?;
        self.assert_dirty(tid, modified)
    }

    /// Mark pages dirty with `tid`, then re-assert them into the pool
    /// (insert-or-bump; may evict another page).
    fn assert_dirty(
        &self,
        tid: TransactionId,
        pages: Vec<PagePtr>,
    ) -> Result<(), BufferPoolError> {
        for page in pages {
            let pid = {
                let mut guard = page.write();
                guard.mark_dirty(tid);
                guard.id
            };
            self.insert_page(pid, page)?;
        }
        Ok(())
    }

    /// Write every dirty page to disk. Shutdown/testing aid; unsafe while
    /// transactions are in flight because it breaks NO-STEAL.
    pub fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        let pids: Vec<PageId> = self.state.lock().pages.keys().copied().collect();
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Flush then drop one page, regardless of recency. Used by the access
    /// method when a page becomes ineligible for reuse.
    pub fn discard_page(&self, pid: PageId) -> Result<(), BufferPoolError> {
        self.flush_page(pid)?;
        let mut state = self.state.lock();
        state.pages.remove(&pid);
        state.lru.remove(pid);
        Ok(())
    }

    /// Write one page if dirty, then clear its dirty mark. Absent pages are
    /// a no-op. The page bytes are copied out under the pool mutex and
    /// written without it.
    fn flush_page(&self, pid: PageId) -> Result<(), BufferPoolError> {
        let page = match self.state.lock().pages.get(&pid) {
            Some(page) => page.clone(),
            None => return Ok(()),
        };

        let snapshot = {
            let guard = page.read();
            if !guard.is_dirty() {
                return Ok(());
            }
            (*guard).clone()
        };

        let store = self.store_for(pid.table_id)?;
        store.write_page(&snapshot)?;
        page.write().clear_dirty();
        Ok(())
    }

    /// Insert-or-bump a page, evicting if the pool is at capacity. When a
    /// concurrent miss already inserted a copy for `pid`, that resident copy
    /// wins and is returned.
    fn insert_page(&self, pid: PageId, page: PagePtr) -> Result<PagePtr, BufferPoolError> {
        let mut state = self.state.lock();

        if let Some(existing) = state.pages.get(&pid) {
            let existing = existing.clone();
            let tick = self.next_tick();
            state.lru.touch(pid, tick);
            return Ok(existing);
        }

        if state.pages.len() >= self.capacity {
            Self::evict_locked(&mut state)?;
        }

        let tick = self.next_tick();
        state.pages.insert(pid, page.clone());
        state.lru.touch(pid, tick);
        Ok(page)
    }

    /// NO-STEAL LRU eviction: discard the oldest clean page. Dirty pages of
    /// in-flight transactions are never written out here; if everything is
    /// dirty the pool is exhausted.
    fn evict_locked(state: &mut PoolState) -> Result<(), BufferPoolError> {
        let PoolState { pages, lru } = state;
        let victim = lru
            .oldest_first()
            .find(|pid| pages.get(pid).map_or(false, |p| !p.read().is_dirty()));

        match victim {
            Some(pid) => {
                debug!("evicting clean page {}", pid);
                pages.remove(&pid);
                lru.remove(pid);
                Ok(())
            }
            None => Err(BufferPoolError::CapacityExhausted),
        }
    }
}
