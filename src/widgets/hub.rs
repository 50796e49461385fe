use std::sync::{Arc, Mutex, TryLockError};

use crate::config::EdataConfig;
use crate::rpc::{NULL_SENTINEL, StatusSink};
use crate::utils::lock_rank::{self, LockRank};
use crate::widgets::binding::WidgetBinding;
use crate::widgets::cache::{DrainStats, WidgetCache};
use crate::widgets::dispatch::update_widget;
use crate::widgets::gui::{GuiBackend, ScreenHandle};
use crate::widgets::prompt::{PromptBanner, PromptOp};

/// Periodic flush hook the scheduler worker calls between passes.
pub trait Drain: Send + Sync {
    fn drain(&self);
}

/// Routes RPC results to widgets without ever blocking on the GUI mutex.
///
/// Direct updates and banner changes only `try_lock` the GUI; on contention they are parked
/// (values in the cache, banner ops as a pending op) and applied by the next [`drain`].
///
/// [`drain`]: UpdateHub::drain
pub struct UpdateHub<G> {
    gui: Arc<Mutex<G>>,
    cache: WidgetCache,
    prompt: PromptBanner,
}

impl<G: GuiBackend> UpdateHub<G> {
    pub fn new(gui: Arc<Mutex<G>>, cfg: &EdataConfig) -> Self {
        Self {
            gui,
            cache: WidgetCache::new(&cfg.cache),
            prompt: PromptBanner::new(cfg.prompt.clone()),
        }
    }

    pub fn gui(&self) -> &Arc<Mutex<G>> {
        &self.gui
    }

    pub fn cache(&self) -> &WidgetCache {
        &self.cache
    }

    pub fn prompt(&self) -> &PromptBanner {
        &self.prompt
    }

    pub fn on_rpc_result(&self, binding: &Arc<WidgetBinding>, values: Vec<String>) {
        if values.iter().all(|v| v == NULL_SENTINEL) {
            tracing::trace!("[UpdateHub] no usable values for {:?}", binding.widget);
            return;
        }

        match self.gui.try_lock() {
            Ok(mut gui) => {
                let _rank = lock_rank::acquired_try(LockRank::Gui);
                update_widget(&mut *gui, binding, &values);
            }
            Err(TryLockError::WouldBlock) => {
                tracing::trace!("[UpdateHub] gui busy, caching {:?}", binding.widget);
                self.cache.put(binding, values);
            }
            Err(TryLockError::Poisoned(_)) => {
                tracing::error!(
                    "[UpdateHub] gui mutex poisoned, dropping update for {:?}",
                    binding.widget
                );
            }
        }
    }

    /// Flushes cached values and any deferred banner op. Returns `None` when the GUI was busy.
    pub fn drain(&self) -> Option<DrainStats> {
        let mut guard = match self.gui.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return None,
            Err(TryLockError::Poisoned(_)) => {
                tracing::error!("[UpdateHub] gui mutex poisoned, skipping drain");
                return None;
            }
        };
        let _rank = lock_rank::acquired_try(LockRank::Gui);
        let gui = &mut *guard;

        let stats = self.cache.drain_with(|binding, values| update_widget(gui, binding, values));
        if stats.expired > 0 {
            tracing::debug!("[UpdateHub] dropped {} stale cache entries", stats.expired);
        }
        self.prompt.apply_pending(gui);
        Some(stats)
    }

    /// Discards cached values of `screen`. Takes only the cache lock.
    pub fn forget_screen(&self, screen: ScreenHandle) {
        let dropped = self.cache.remove_screen(screen);
        if dropped > 0 {
            tracing::debug!("[UpdateHub] dropped {} cached updates of {:?}", dropped, screen);
        }
    }

    pub fn show_prompt(&self, msg: &str) {
        match self.gui.try_lock() {
            Ok(mut gui) => {
                let _rank = lock_rank::acquired_try(LockRank::Gui);
                self.prompt.display(&mut *gui, msg);
            }
            Err(TryLockError::WouldBlock) => self.prompt.defer(PromptOp::Show(msg.to_string())),
            Err(TryLockError::Poisoned(_)) => {
                tracing::error!("[UpdateHub] gui mutex poisoned, prompt not shown: {}", msg);
            }
        }
    }

    pub fn clear_prompt(&self) {
        if !self.prompt.is_active() {
            return;
        }
        match self.gui.try_lock() {
            Ok(mut gui) => {
                let _rank = lock_rank::acquired_try(LockRank::Gui);
                self.prompt.clear(&mut *gui);
            }
            Err(TryLockError::WouldBlock) => self.prompt.defer(PromptOp::Clear),
            Err(TryLockError::Poisoned(_)) => {
                tracing::error!("[UpdateHub] gui mutex poisoned, prompt not cleared");
            }
        }
    }
}

impl<G: GuiBackend> Drain for UpdateHub<G> {
    fn drain(&self) {
        UpdateHub::drain(self);
    }
}

impl<G: GuiBackend> StatusSink for UpdateHub<G> {
    fn on_sustained_failure(&self, msg: &str) {
        self.show_prompt(msg);
    }

    fn on_recovered(&self) {
        self.clear_prompt();
    }
}
