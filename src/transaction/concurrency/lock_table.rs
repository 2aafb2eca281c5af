use std::collections::HashMap;

use crate::common::types::{PageId, TransactionId};

/// Page lock modes. Shared locks are compatible with each other; everything
/// else conflicts unless the conflicting holder is the requester itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Derived lock status of a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageLockStatus {
    Idle,
    SingleRead,
    MultiRead,
    SingleWrite,
}

/// Symmetric page/transaction lock bookkeeping. Both maps are mutated only
/// while the lock manager's critical section is held, and always together.
#[derive(Debug, Default)]
pub(crate) struct LockTable {
    by_page: HashMap<PageId, HashMap<TransactionId, LockMode>>,
    by_txn: HashMap<TransactionId, HashMap<PageId, LockMode>>,
}

impl LockTable {
    fn status(&self, pid: PageId) -> PageLockStatus {
        match self.by_page.get(&pid) {
            None => PageLockStatus::Idle,
            Some(holders) => match holders.len() {
                0 => PageLockStatus::Idle,
                1 => {
                    if holders.values().any(|&m| m == LockMode::Exclusive) {
                        PageLockStatus::SingleWrite
                    } else {
                        PageLockStatus::SingleRead
                    }
                }
                _ => PageLockStatus::MultiRead,
            },
        }
    }

    fn record(&mut self, tid: TransactionId, pid: PageId, mode: LockMode) {
        self.by_page.entry(pid).or_default().insert(tid, mode);
        self.by_txn.entry(tid).or_default().insert(pid, mode);
    }

    /// One grant attempt. Granting records the lock in both maps; a deny
    /// never mutates. The Shared→Exclusive upgrade for a sole reader happens
    /// in place, with no intermediate release.
    pub fn try_acquire(&mut self, tid: TransactionId, pid: PageId, mode: LockMode) -> bool {
        let status = self.status(pid);
        match mode {
            LockMode::Shared => match status {
                PageLockStatus::Idle | PageLockStatus::SingleRead | PageLockStatus::MultiRead => {
                    self.record(tid, pid, LockMode::Shared);
                    true
                }
                // The writer itself may keep reading; its lock stays Exclusive.
                PageLockStatus::SingleWrite => self.holds(tid, pid),
            },
            LockMode::Exclusive => match status {
                PageLockStatus::Idle => {
                    self.record(tid, pid, LockMode::Exclusive);
                    true
                }
                PageLockStatus::SingleWrite => self.holds(tid, pid),
                PageLockStatus::SingleRead => {
                    if self.holds(tid, pid) {
                        self.record(tid, pid, LockMode::Exclusive);
                        true
                    } else {
                        false
                    }
                }
                PageLockStatus::MultiRead => false,
            },
        }
    }

    /// Remove both directional entries; idempotent.
    pub fn release(&mut self, tid: TransactionId, pid: PageId) {
        if let Some(holders) = self.by_page.get_mut(&pid) {
            holders.remove(&tid);
            if holders.is_empty() {
                self.by_page.remove(&pid);
            }
        }
        if let Some(pages) = self.by_txn.get_mut(&tid) {
            pages.remove(&pid);
            if pages.is_empty() {
                self.by_txn.remove(&tid);
            }
        }
    }

    /// Release every lock held by `tid`, returning the pages released.
    pub fn release_all(&mut self, tid: TransactionId) -> Vec<PageId> {
        let pids = self.pages_of(tid);
        for &pid in &pids {
            self.release(tid, pid);
        }
        pids
    }

    pub fn holds(&self, tid: TransactionId, pid: PageId) -> bool {
        self.by_page
            .get(&pid)
            .map_or(false, |holders| holders.contains_key(&tid))
    }

    /// Transactions currently holding a lock on `pid`.
    pub fn holders(&self, pid: PageId) -> Vec<TransactionId> {
        self.by_page
            .get(&pid)
            .map(|holders| holders.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Pages locked by `tid`, ordered by page id for deterministic iteration.
    pub fn pages_of(&self, tid: TransactionId) -> Vec<PageId> {
        let mut pids: Vec<PageId> = self
            .by_txn
            .get(&tid)
            .map(|pages| pages.keys().copied().collect())
            .unwrap_or_default();
        pids.sort();
        pids
    }
}
