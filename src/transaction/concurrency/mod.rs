// Page-granularity two-phase locking with wait-for deadlock detection.

use std::thread;
use std::time::Duration;

use log::warn;
use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::{PageId, TransactionId};

mod lock_table;
mod wait_graph;

pub use lock_table::LockMode;
use lock_table::LockTable;
use wait_graph::WaitForGraph;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("{0} chosen as deadlock victim")]
    Deadlock(TransactionId),
}

/// Pause between retries of a denied lock request.
const RETRY_BACKOFF: Duration = Duration::from_millis(1);

/// Lock table and wait-for graph behind one critical section, so a
/// grant/deny decision and its wait-for edge are always mutually consistent.
#[derive(Default)]
pub struct LockManager {
    state: Mutex<LockState>,
}

#[derive(Default)]
struct LockState {
    table: LockTable,
    waits: WaitForGraph,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock is granted or the request is found to deadlock.
    /// Every retry either observes the grant or a newly formed cycle, so a
    /// waiter cannot livelock. On deadlock the victim's pending edges are
    /// dropped immediately (one victim per cycle); its held locks stay put
    /// until the caller finalizes the transaction.
    pub fn acquire(
        &self,
        tid: TransactionId,
        pid: PageId,
        mode: LockMode,
    ) -> Result<(), LockError> {
        loop {
            {
                let mut state = self.state.lock();
                if state.table.try_acquire(tid, pid, mode) {
                    state.waits.clear_request(tid, pid);
                    return Ok(());
                }

                let LockState { table, waits } = &mut *state;
                if waits.has_cycle_if_add(tid, pid, table) {
                    warn!("deadlock: aborting {} waiting for page {}", tid, pid);
                    waits.clear_transaction(tid);
                    return Err(LockError::Deadlock(tid));
                }
                waits.add_request(tid, pid);
            }

            thread::sleep(RETRY_BACKOFF);
        }
    }

    /// Unilateral release of a single lock; idempotent.
    pub fn release(&self, tid: TransactionId, pid: PageId) {
        self.state.lock().table.release(tid, pid);
    }

    /// Drop every lock and pending request of `tid`; returns the pages whose
    /// locks were released.
    pub fn release_all(&self, tid: TransactionId) -> Vec<PageId> {
        let mut state = self.state.lock();
        state.waits.clear_transaction(tid);
        state.table.release_all(tid)
    }

    pub fn holds(&self, tid: TransactionId, pid: PageId) -> bool {
        self.state.lock().table.holds(tid, pid)
    }

    /// Pages `tid` currently holds any lock on, ordered by page id.
    pub fn pages_of(&self, tid: TransactionId) -> Vec<PageId> {
        self.state.lock().table.pages_of(tid)
    }
}
