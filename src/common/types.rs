use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;

/// Default page size in bytes (4KB)
pub const DEFAULT_PAGE_SIZE: usize = 4096;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

/// Current page size in bytes. All pages in a process share one size.
pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Relaxed)
}

/// Override the page size. Intended for tests only; changing the size while
/// any pool or file is live invalidates every existing page.
pub fn set_page_size(bytes: usize) {
    PAGE_SIZE.store(bytes, Ordering::Relaxed);
}

/// Table ID type
pub type TableId = u32;

/// Identity of a single fixed-size page inside a table's backing file.
/// Page `page_no` starts at byte offset `page_no * page_size()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: u32,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: u32) -> Self {
        Self { table_id, page_no }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.page_no)
    }
}

static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, globally unique transaction identifier, minted on transaction
/// start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new() -> Self {
        Self(NEXT_TXN_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

/// Page structure: a fixed-size byte payload plus ownership metadata. A page
/// is dirty exactly when `dirty_by` names the transaction that modified it.
#[derive(Debug, Clone)]
pub struct Page {
    pub id: PageId,
    pub data: Box<[u8]>,
    pub dirty_by: Option<TransactionId>,
}

impl Page {
    pub fn new(id: PageId) -> Self {
        Self {
            id,
            data: vec![0; page_size()].into_boxed_slice(),
            dirty_by: None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_by.is_some()
    }

    pub fn mark_dirty(&mut self, tid: TransactionId) {
        self.dirty_by = Some(tid);
    }

    pub fn clear_dirty(&mut self) {
        self.dirty_by = None;
    }
}

/// Smart pointer to a page. The buffer pool holds the single in-memory copy
/// per page id; everyone else shares it through this pointer.
pub type PagePtr = Arc<RwLock<Page>>;
