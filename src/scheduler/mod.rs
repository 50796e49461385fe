//! Periodic task scheduler driven by one worker thread.
//!
//! Tasks sit in a list guarded by one mutex; the worker walks it, fires every due task
//! synchronously with the list locked, drains the widget cache at a fixed cadence and then
//! sleeps on a condition variable that task mutations and shutdown signal.

mod task;

pub use task::{PeriodicTask, TaskCallback, TaskId};

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use parking_lot::{Condvar, Mutex};
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;

use crate::config::SchedulerConfig;
use crate::utils::lock_rank::{self, LockRank};
use crate::utils::time::{elapsed_ms, now_ms};
use crate::utils::{CancelToken, HealthFlag, try_pin_core};
use crate::widgets::{Drain, ScreenHandle, WidgetBinding};

struct Inner {
    tasks: Mutex<VecDeque<PeriodicTask>>,
    wake: Condvar,
    /// Set under the list lock by mutations, consumed by the worker before it sleeps.
    dirty: AtomicBool,
    next_id: AtomicU64,
    in_flight: AtomicUsize,
    cancel: CancelToken,
    cfg: SchedulerConfig,
}

/// Shared handle to the task list. Cloning is cheap.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

/// Releases one in-flight slot on drop.
struct InFlightPermit<'a>(&'a AtomicUsize);

impl<'a> InFlightPermit<'a> {
    fn try_acquire(counter: &'a AtomicUsize, max: usize) -> Option<Self> {
        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .ok()
            .map(|_| Self(counter))
    }
}

impl Drop for InFlightPermit<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Scheduler {
    /// Empty scheduler; nothing runs until [`spawn`](Self::spawn) or [`run`](Self::run).
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self::with_cancel(cfg, CancelToken::new_root())
    }

    /// Scheduler stopped by `cancel` (or any of its ancestors).
    pub fn with_cancel(cfg: SchedulerConfig, cancel: CancelToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                tasks: Mutex::new(VecDeque::new()),
                wake: Condvar::new(),
                dirty: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
                in_flight: AtomicUsize::new(0),
                cancel,
                cfg,
            }),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.cfg
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Registers a task that fires on the next pass and then every `period_ms`.
    ///
    /// Returns `None` once the scheduler has been stopped.
    pub fn create_task(
        &self,
        period_ms: u64,
        callback: TaskCallback,
        binding: Arc<WidgetBinding>,
    ) -> Option<TaskId> {
        if self.is_stopped() {
            tracing::warn!("[Scheduler] stopped, task for {:?} not created", binding.widget);
            return None;
        }
        let id = TaskId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let _rank = lock_rank::blocking(LockRank::TaskList);
            self.inner.tasks.lock().push_front(PeriodicTask {
                id,
                period_ms,
                last_fire_ms: None,
                callback,
                binding,
            });
            self.inner.dirty.store(true, Ordering::Release);
        }
        self.inner.wake.notify_all();
        tracing::debug!("[Scheduler] created {} every {} ms", id, period_ms);
        Some(id)
    }

    /// Drops every task bound to `screen`. Returns how many were removed.
    pub fn clear_tasks_for_screen(&self, screen: ScreenHandle) -> usize {
        let removed = {
            let _rank = lock_rank::blocking(LockRank::TaskList);
            let mut tasks = self.inner.tasks.lock();
            let before = tasks.len();
            tasks.retain(|t| t.binding.screen != screen);
            self.inner.dirty.store(true, Ordering::Release);
            before - tasks.len()
        };
        self.inner.wake.notify_all();
        if removed > 0 {
            tracing::debug!("[Scheduler] cleared {} tasks of {:?}", removed, screen);
        }
        removed
    }

    pub fn task_count(&self) -> usize {
        let _rank = lock_rank::blocking(LockRank::TaskList);
        self.inner.tasks.lock().len()
    }

    /// Asks the worker to exit at its next loop boundary. A running callback completes.
    pub fn stop(&self) {
        self.inner.cancel.cancel();
        {
            // Serialises with the worker's check-then-wait so the notify cannot be lost.
            let _rank = lock_rank::blocking(LockRank::TaskList);
            drop(self.inner.tasks.lock());
        }
        self.inner.wake.notify_all();
    }

    /// One walk over the task list. Returns whether any task fired.
    pub(crate) fn fire_due(&self, now: u64) -> bool {
        let _rank = lock_rank::blocking(LockRank::TaskList);
        let mut tasks = self.inner.tasks.lock();
        let mut fired = false;

        for task in tasks.iter_mut() {
            if !task.is_due(now) {
                continue;
            }
            let Some(_permit) =
                InFlightPermit::try_acquire(&self.inner.in_flight, self.inner.cfg.max_in_flight)
            else {
                continue;
            };
            (task.callback)(&task.binding);
            task.last_fire_ms = Some(now);
            fired = true;
        }
        fired
    }

    fn sleep(&self, ms: u64) {
        let _rank = lock_rank::blocking(LockRank::TaskList);
        let mut tasks = self.inner.tasks.lock();
        if self.is_stopped() || self.inner.dirty.swap(false, Ordering::AcqRel) {
            return;
        }
        self.inner.wake.wait_for(&mut tasks, Duration::from_millis(ms));
    }

    /// Worker loop. Returns when the scheduler is stopped or `term` is raised.
    pub fn run(&self, drainer: &dyn Drain, term: Option<&AtomicBool>) {
        let cfg = &self.inner.cfg;
        let mut last_drain = 0u64;

        while !self.is_stopped() {
            if let Some(term) = term
                && term.load(Ordering::Relaxed)
            {
                tracing::warn!("[Scheduler] termination signal received");
                self.stop();
                break;
            }

            let now = now_ms();
            let fired = self.fire_due(now);

            if elapsed_ms(now, last_drain) > cfg.drain_interval_ms {
                drainer.drain();
                last_drain = now;
            }

            self.sleep(if fired {
                cfg.busy_sleep_ms
            } else {
                cfg.idle_sleep_ms
            });
        }
    }

    /// Starts the worker thread.
    pub fn spawn(&self, drainer: Arc<dyn Drain>) -> Result<SchedulerHandle> {
        let running = HealthFlag::new(false);
        let scheduler = self.clone();
        let join = {
            let running = running.clone();
            thread::Builder::new()
                .name("edata-scheduler".into())
                .spawn(move || {
                    let cfg = scheduler.config().clone();

                    let term = Arc::new(AtomicBool::new(false));
                    if cfg.handle_term_signals {
                        for sig in TERM_SIGNALS {
                            if let Err(e) = flag::register(*sig, term.clone()) {
                                tracing::error!("[Scheduler] cannot register signal {}: {}", sig, e);
                            }
                        }
                    }

                    if let Some(core_id) = cfg.core_id {
                        match try_pin_core(core_id) {
                            Ok(core_id) => tracing::info!("[Scheduler] pinned to core: {}", core_id),
                            Err(e) => {
                                tracing::error!("[Scheduler] cannot pin core: {}", e);
                                return;
                            }
                        }
                    }

                    running.up();
                    tracing::info!("[Scheduler] worker started");
                    scheduler.run(drainer.as_ref(), Some(term.as_ref()));
                    running.down();
                    tracing::info!("[Scheduler] worker stopped");
                })?
        };

        Ok(SchedulerHandle {
            scheduler: self.clone(),
            join: Some(join),
            running,
        })
    }
}

/// Owner of the worker thread. Dropping it stops the worker without joining.
pub struct SchedulerHandle {
    scheduler: Scheduler,
    join: Option<JoinHandle<()>>,
    running: HealthFlag,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn running_flag(&self) -> HealthFlag {
        self.running.clone()
    }

    /// Stops the worker and waits for it to exit.
    pub fn shutdown(mut self) {
        self.scheduler.stop();
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            tracing::error!("[Scheduler] worker panicked");
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}
