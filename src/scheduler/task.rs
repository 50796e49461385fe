use std::fmt;
use std::sync::Arc;

use crate::widgets::WidgetBinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Work run by the scheduler worker with the task list locked.
///
/// Must not call back into the [`Scheduler`](super::Scheduler) on the same thread.
pub type TaskCallback = Arc<dyn Fn(&Arc<WidgetBinding>) + Send + Sync>;

pub struct PeriodicTask {
    pub(crate) id: TaskId,
    pub(crate) period_ms: u64,
    /// `None` until the first fire.
    pub(crate) last_fire_ms: Option<u64>,
    pub(crate) callback: TaskCallback,
    pub(crate) binding: Arc<WidgetBinding>,
}

impl PeriodicTask {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn binding(&self) -> &Arc<WidgetBinding> {
        &self.binding
    }

    #[inline]
    pub(crate) fn is_due(&self, now: u64) -> bool {
        match self.last_fire_ms {
            None => true,
            Some(last) => now > last.saturating_add(self.period_ms),
        }
    }
}

impl fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("id", &self.id)
            .field("period_ms", &self.period_ms)
            .field("last_fire_ms", &self.last_fire_ms)
            .field("widget", &self.binding.widget)
            .finish()
    }
}
