use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::common::types::{Page, PageId, PagePtr, TableId, TransactionId};
use crate::storage::buffer::{BufferPool, BufferPoolError};
use crate::storage::disk::{PageStore, PageStoreError};
use crate::storage::page::PageManager;
use crate::transaction::concurrency::LockMode;
use crate::tuple::{RecordId, Schema, Tuple};

static NEXT_TABLE_ID: AtomicU32 = AtomicU32::new(1);

/// A table stored as a densely packed array of slotted pages in one backing
/// file. All page access is routed through the buffer pool so the usual
/// locking and dirty-page discipline applies; the only direct disk write is
/// the zeroed page that extends the file on append.
pub struct HeapFile {
    table_id: TableId,
    schema: Schema,
    store: Arc<PageStore>,
    page_manager: PageManager,
    /// Serializes file extension; the scan itself runs lock-free.
    append_lock: Mutex<()>,
}

impl HeapFile {
    pub fn open(path: impl AsRef<Path>, schema: Schema) -> Result<Self, PageStoreError> {
        Ok(Self {
            table_id: NEXT_TABLE_ID.fetch_add(1, Ordering::SeqCst),
            schema,
            store: Arc::new(PageStore::open(path)?),
            page_manager: PageManager::new(),
            append_lock: Mutex::new(()),
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> Arc<PageStore> {
        self.store.clone()
    }

    pub fn num_pages(&self) -> Result<u32, PageStoreError> {
        self.store.num_pages()
    }

    /// Insert into the first page with a free slot, locking each candidate
    /// page exclusively; when every page is full, extend the file with a
    /// fresh empty page and insert through the pool so the new page follows
    /// the normal dirty/abort discipline. Returns the record id and the
    /// modified pages.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        pool: &BufferPool,
        tuple: &mut Tuple,
    ) -> Result<(RecordId, Vec<PagePtr>), BufferPoolError> {
        if !self.schema.matches(tuple) {
            return Err(crate::storage::page::PageError::SchemaMismatch.into());
        }

        let mut scanned = 0;
        loop {
            let num_pages = self.num_pages()?;
            for page_no in scanned..num_pages {
                let pid = PageId::new(self.table_id, page_no);
                let page = pool.get_page(tid, pid, LockMode::Exclusive)?;

                let slot = {
                    let mut guard = page.write();
                    if self.page_manager.free_slot_count(&guard, &self.schema) == 0 {
                        None
                    } else {
                        Some(self.page_manager.insert_tuple(&mut guard, &self.schema, tuple)?)
                    }
                };

                if let Some(slot) = slot {
                    let rid = RecordId { page_id: pid, slot };
                    tuple.set_record_id(Some(rid));
                    return Ok((rid, vec![page]));
                }
                // Full page: the exclusive lock is retained (strict 2PL).
            }
            scanned = num_pages;

            // Every page seen so far is full. Persist a well-formed empty
            // page at the end of the file, then take it through the pool
            // like any other. Extension is serialized: only the appender
            // that still observes the old length writes the fresh page;
            // losers rescan the tail that appeared meanwhile.
            let appended = {
                let _guard = self.append_lock.lock();
                if self.num_pages()? == num_pages {
                    let pid = PageId::new(self.table_id, num_pages);
                    let mut fresh = Page::new(pid);
                    self.page_manager.init_page(&mut fresh);
                    self.store.write_page(&fresh)?;
                    Some(pid)
                } else {
                    None
                }
            };

            let Some(pid) = appended else { continue };
            debug!("table {} is full, appended page {}", self.table_id, pid);

            let page = pool.get_page(tid, pid, LockMode::Exclusive)?;
            let slot = {
                let mut guard = page.write();
                self.page_manager.insert_tuple(&mut guard, &self.schema, tuple)?
            };
            let rid = RecordId { page_id: pid, slot };
            tuple.set_record_id(Some(rid));
            return Ok((rid, vec![page]));
        }
    }

    /// Remove the tuple at its record id, locking its page exclusively.
    pub fn delete_tuple(
        &self,
        tid: TransactionId,
        pool: &BufferPool,
        tuple: &Tuple,
    ) -> Result<Vec<PagePtr>, BufferPoolError> {
        let rid = tuple.record_id().ok_or_else(|| {
            BufferPoolError::InvalidOperation("tuple has no record id".to_string())
        })?;
        if rid.page_id.table_id != self.table_id {
            return Err(BufferPoolError::InvalidOperation(format!(
                "record id {} does not belong to table {}",
                rid.page_id, self.table_id
            )));
        }

        let page = pool.get_page(tid, rid.page_id, LockMode::Exclusive)?;
        {
            let mut guard = page.write();
            self.page_manager.delete_slot(&mut guard, &self.schema, rid.slot)?;
        }
        Ok(vec![page])
    }

    /// Lazy scan over all tuples in page-then-slot order. Each page is
    /// acquired shared on advance and its lock kept for the transaction's
    /// lifetime (strict 2PL).
    pub fn iterator<'a>(&'a self, tid: TransactionId, pool: &'a BufferPool) -> HeapFileIterator<'a> {
        HeapFileIterator {
            file: self,
            pool,
            tid,
            opened: false,
            next_page_no: 0,
            current: VecDeque::new(),
        }
    }
}

pub struct HeapFileIterator<'a> {
    file: &'a HeapFile,
    pool: &'a BufferPool,
    tid: TransactionId,
    opened: bool,
    next_page_no: u32,
    current: VecDeque<Tuple>,
}

impl HeapFileIterator<'_> {
    pub fn open(&mut self) {
        self.opened = true;
    }

    pub fn has_next(&mut self) -> Result<bool, BufferPoolError> {
        if !self.opened {
            return Ok(false);
        }
        while self.current.is_empty() {
            if self.next_page_no >= self.file.num_pages()? {
                return Ok(false);
            }
            let pid = PageId::new(self.file.table_id, self.next_page_no);
            let page = self.pool.get_page(self.tid, pid, LockMode::Shared)?;
            {
                let guard = page.read();
                self.current = self
                    .file
                    .page_manager
                    .tuples(&guard, &self.file.schema)
                    .into();
            }
            self.next_page_no += 1;
        }
        Ok(true)
    }

    pub fn next(&mut self) -> Result<Tuple, BufferPoolError> {
        if !self.has_next()? {
            return Err(BufferPoolError::InvalidOperation(
                "iterator exhausted".to_string(),
            ));
        }
        self.current.pop_front().ok_or_else(|| {
            BufferPoolError::InvalidOperation("iterator exhausted".to_string())
        })
    }

    /// Restart the scan from page 0. Locks already taken stay held.
    pub fn rewind(&mut self) {
        self.next_page_no = 0;
        self.current.clear();
    }

    pub fn close(&mut self) {
        self.opened = false;
        self.current.clear();
    }
}
