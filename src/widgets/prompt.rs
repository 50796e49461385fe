use parking_lot::Mutex;

use crate::config::PromptConfig;
use crate::utils::lock_rank::{self, LockRank};
use crate::widgets::gui::{GuiBackend, WidgetHandle};

/// Banner change that could not be applied because the GUI was busy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOp {
    Show(String),
    Clear,
}

#[derive(Default)]
struct PromptState {
    handle: Option<WidgetHandle>,
    pending: Option<PromptOp>,
}

/// Error banner drawn on the top layer while the remote is failing.
///
/// The GUI-touching methods expect the caller to hold the GUI mutex.
pub struct PromptBanner {
    state: Mutex<PromptState>,
    cfg: PromptConfig,
}

impl PromptBanner {
    pub fn new(cfg: PromptConfig) -> Self {
        Self {
            state: Mutex::new(PromptState::default()),
            cfg,
        }
    }

    /// Shows `msg`, creating the label if there is none or the old one was destroyed.
    pub fn display<G: GuiBackend + ?Sized>(&self, gui: &mut G, msg: &str) {
        let _rank = lock_rank::blocking(LockRank::Prompt);
        let mut state = self.state.lock();
        state.pending = None;

        let handle = match state.handle {
            Some(h) if gui.is_widget_valid(h) => h,
            _ => {
                let h = self.create(gui);
                state.handle = Some(h);
                h
            }
        };
        gui.set_label_text(handle, msg);
    }

    /// Removes the banner if one is up.
    pub fn clear<G: GuiBackend + ?Sized>(&self, gui: &mut G) {
        let _rank = lock_rank::blocking(LockRank::Prompt);
        let mut state = self.state.lock();
        state.pending = None;
        if let Some(h) = state.handle.take()
            && gui.is_widget_valid(h)
        {
            gui.delete_widget(h);
            tracing::debug!("[UpdateHub] prompt cleared");
        }
    }

    /// Stores `op` for the next drain; a later op replaces an earlier one.
    pub fn defer(&self, op: PromptOp) {
        let _rank = lock_rank::blocking(LockRank::Prompt);
        self.state.lock().pending = Some(op);
    }

    pub fn apply_pending<G: GuiBackend + ?Sized>(&self, gui: &mut G) {
        let pending = {
            let _rank = lock_rank::blocking(LockRank::Prompt);
            self.state.lock().pending.take()
        };
        match pending {
            Some(PromptOp::Show(msg)) => self.display(gui, &msg),
            Some(PromptOp::Clear) => self.clear(gui),
            None => {}
        }
    }

    /// True when a banner is up or about to be.
    pub fn is_active(&self) -> bool {
        let _rank = lock_rank::blocking(LockRank::Prompt);
        let state = self.state.lock();
        match &state.pending {
            Some(PromptOp::Show(_)) => true,
            Some(PromptOp::Clear) => false,
            None => state.handle.is_some(),
        }
    }

    pub fn pending(&self) -> Option<PromptOp> {
        let _rank = lock_rank::blocking(LockRank::Prompt);
        self.state.lock().pending.clone()
    }

    fn create<G: GuiBackend + ?Sized>(&self, gui: &mut G) -> WidgetHandle {
        let h = gui.create_label_on_top_layer();
        gui.set_pos(h, 0, 0);
        gui.set_size(h, gui.display_hres(), self.cfg.height_px);
        gui.set_label_scrolling(h);
        gui.set_text_color(h, self.cfg.text_color);
        gui.set_border_width(h, self.cfg.border_width);
        gui.set_radius(h, self.cfg.radius);
        if let Some(font) = &self.cfg.font {
            gui.set_text_font(h, font);
        }
        tracing::debug!("[UpdateHub] prompt created as {:?}", h);
        h
    }
}
