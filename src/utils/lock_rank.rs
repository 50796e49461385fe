//! Runtime check of the global lock order.
//!
//! Every lock owned by this crate has a rank. A thread may only *block* on a lock whose rank is
//! strictly greater than every rank it already holds; non-blocking `try_lock` acquisitions are
//! exempt because they cannot deadlock. Violations trip a `debug_assert!`, so they surface in
//! tests and debug builds while release builds only pay for a thread-local push/pop.
//!
//! Order: GUI -> task list -> RPC -> cache -> prompt.

use std::cell::RefCell;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockRank {
    Gui = 1,
    TaskList = 2,
    Rpc = 3,
    Cache = 4,
    Prompt = 5,
}

impl fmt::Display for LockRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockRank::Gui => "gui",
            LockRank::TaskList => "task-list",
            LockRank::Rpc => "rpc",
            LockRank::Cache => "cache",
            LockRank::Prompt => "prompt",
        };
        f.write_str(name)
    }
}

thread_local! {
    static HELD: RefCell<Vec<LockRank>> = const { RefCell::new(Vec::new()) };
}

/// Marks `rank` as held by the current thread until dropped.
#[must_use = "the rank is released when the guard drops"]
#[derive(Debug)]
pub struct RankGuard {
    rank: LockRank,
}

impl Drop for RankGuard {
    fn drop(&mut self) {
        HELD.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|r| *r == self.rank) {
                held.remove(pos);
            }
        });
    }
}

/// Records a blocking acquisition of `rank`. Call *before* blocking on the lock.
#[inline]
pub fn blocking(rank: LockRank) -> RankGuard {
    HELD.with(|held| {
        let mut held = held.borrow_mut();
        if let Some(top) = held.iter().max() {
            debug_assert!(
                *top < rank,
                "lock order violation: blocking on {rank} while holding {top}"
            );
        }
        held.push(rank);
    });
    RankGuard { rank }
}

/// Records a successful non-blocking acquisition of `rank`.
#[inline]
pub fn acquired_try(rank: LockRank) -> RankGuard {
    HELD.with(|held| held.borrow_mut().push(rank));
    RankGuard { rank }
}

/// Ranks currently held by this thread, in acquisition order.
pub fn held() -> Vec<LockRank> {
    HELD.with(|held| held.borrow().clone())
}
