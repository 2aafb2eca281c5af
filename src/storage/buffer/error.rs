use thiserror::Error;

use crate::common::types::{TableId, TransactionId};
use crate::storage::disk::PageStoreError;
use crate::storage::page::PageError;
use crate::transaction::concurrency::LockError;

#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error("{0} aborted by deadlock detection")]
    TransactionAborted(TransactionId),

    #[error("cannot evict: every buffered page is dirty")]
    CapacityExhausted,

    #[error("no file registered for table {0}")]
    UnknownTable(TableId),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("page store error: {0}")]
    PageStore(#[from] PageStoreError),

    #[error("page error: {0}")]
    Page(#[from] PageError),
}

impl From<LockError> for BufferPoolError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Deadlock(tid) => BufferPoolError::TransactionAborted(tid),
        }
    }
}
