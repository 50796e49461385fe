pub mod binding;
pub mod cache;
pub mod dispatch;
pub mod gui;
mod hub;
#[cfg(test)]
pub(crate) mod mock;
pub mod prompt;

pub use binding::{ApiMethod, VariableRef, WidgetBinding, WidgetKind};
pub use cache::{DrainStats, WidgetCache};
pub use dispatch::{parse_int, update_widget};
pub use gui::{
    Anim, GuiBackend, IndicatorHandle, ScreenHandle, SeriesHandle, WidgetHandle, WidgetState,
};
pub use hub::{Drain, UpdateHub};
pub use prompt::{PromptBanner, PromptOp};
