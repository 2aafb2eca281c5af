// Export public modules
pub mod common;
pub mod stats;
pub mod storage;
pub mod transaction;
pub mod tuple;

// Re-export key items for convenient access
pub use common::types::{Page, PageId, PagePtr, TableId, TransactionId};
pub use storage::buffer::{BufferPool, BufferPoolError};
pub use storage::disk::{PageStore, PageStoreError};
pub use storage::heap::{HeapFile, HeapFileIterator};
pub use storage::page::{PageError, PageManager};
pub use transaction::concurrency::{LockError, LockManager, LockMode};
pub use stats::{IntHistogram, StringHistogram, TableStats};
