//! Wiring of the scheduler, RPC client and update hub behind one value owned by the application.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use crate::config::EdataConfig;
use crate::rpc::RpcClient;
use crate::scheduler::{Scheduler, SchedulerHandle, TaskCallback, TaskId};
use crate::transport::{Connector, TungsteniteConnector};
use crate::utils::CancelToken;
use crate::widgets::{
    ApiMethod, DrainStats, GuiBackend, ScreenHandle, UpdateHub, WidgetBinding,
};

/// Banner text when the eager connect at start-up fails.
pub const CONNECT_FAILED_MSG: &str = "websocket connect failed.";

/// Callback of a periodic read task: reads every bound variable and routes the values to the hub.
///
/// Bindings not polled with `ReadVariable` are ignored.
pub fn read_task<G, C>(rpc: Arc<RpcClient<C>>, hub: Arc<UpdateHub<G>>) -> TaskCallback
where
    G: GuiBackend + 'static,
    C: Connector,
{
    Arc::new(move |binding: &Arc<WidgetBinding>| {
        if binding.api != ApiMethod::ReadVariable {
            return;
        }
        let values = rpc.read_variables(&binding.variable_names());
        if values.is_empty() {
            tracing::warn!("[ExternalData] failed to read variables, skipping UI update");
            return;
        }
        hub.on_rpc_result(binding, values);
    })
}

/// External-data runtime of one application.
///
/// The GUI thread keeps using the same `Arc<Mutex<G>>` it hands in here; every path into the
/// GUI from this side only try-locks it.
pub struct ExternalData<G: GuiBackend + 'static, C: Connector> {
    cfg: EdataConfig,
    rpc: Arc<RpcClient<C>>,
    hub: Arc<UpdateHub<G>>,
    scheduler: Scheduler,
    /// Root of the worker's token; cancelling it stops the worker from any thread.
    cancel: CancelToken,
    started: AtomicBool,
}

impl<G: GuiBackend + 'static> ExternalData<G, TungsteniteConnector> {
    /// Runtime talking to `cfg.server_url` over a real WebSocket.
    pub fn with_websocket(cfg: EdataConfig, gui: Arc<Mutex<G>>) -> Self {
        let connector = TungsteniteConnector::from_config(&cfg.rpc);
        Self::new(cfg, connector, gui)
    }

    pub fn from_file(path: impl AsRef<str>, gui: Arc<Mutex<G>>) -> Result<Self> {
        let cfg = EdataConfig::load(path)?;
        Ok(Self::with_websocket(cfg, gui))
    }
}

impl<G: GuiBackend + 'static, C: Connector> ExternalData<G, C> {
    pub fn new(cfg: EdataConfig, connector: C, gui: Arc<Mutex<G>>) -> Self {
        let hub = Arc::new(UpdateHub::new(gui, &cfg));
        let rpc = Arc::new(
            RpcClient::new(cfg.server_url.clone(), cfg.rpc.clone(), connector)
                .with_status_sink(hub.clone()),
        );
        let cancel = CancelToken::new_root();
        let scheduler = Scheduler::with_cancel(cfg.scheduler.clone(), cancel.new_child());
        Self {
            cfg,
            rpc,
            hub,
            scheduler,
            cancel,
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &EdataConfig {
        &self.cfg
    }

    pub fn rpc(&self) -> &Arc<RpcClient<C>> {
        &self.rpc
    }

    pub fn hub(&self) -> &Arc<UpdateHub<G>> {
        &self.hub
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Eager first connection. On failure the banner goes up and calls still reconnect lazily.
    pub fn connect_init(&self) -> bool {
        match self.rpc.connect() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("[ExternalData] initial connect failed: {}", e);
                self.hub.show_prompt(CONNECT_FAILED_MSG);
                false
            }
        }
    }

    /// Polls `binding`'s variables every `period_ms` and shows them on its widget.
    pub fn bind_read(&self, period_ms: u64, binding: WidgetBinding) -> Result<TaskId> {
        let callback = read_task(self.rpc.clone(), self.hub.clone());
        self.scheduler
            .create_task(period_ms, callback, Arc::new(binding))
            .ok_or_else(|| anyhow!("[ExternalData] scheduler is stopped"))
    }

    pub fn write_variable(&self, name: &str, value: i64) {
        self.rpc.write_variable(name, value);
    }

    /// Stops polling for every widget of `screen`, e.g. before the screen is deleted.
    ///
    /// Values already cached for the screen are dropped too, so no later drain reaches it.
    pub fn clear_screen(&self, screen: ScreenHandle) -> usize {
        // Callbacks run under the task list lock: once this returns none is mid-flight.
        let removed = self.scheduler.clear_tasks_for_screen(screen);
        self.hub.forget_screen(screen);
        removed
    }

    /// Cache flush for the GUI thread. Must not be called with the GUI mutex held.
    pub fn drain(&self) -> Option<DrainStats> {
        self.hub.drain()
    }

    /// Starts the scheduler worker. A runtime can be started once.
    pub fn start(&self) -> Result<SchedulerHandle> {
        if self.scheduler.is_stopped() {
            return Err(anyhow!("[ExternalData] scheduler already shut down"));
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(anyhow!("[ExternalData] worker already started"));
        }
        let handle = self.scheduler.spawn(self.hub.clone())?;
        tracing::info!("[ExternalData] started against {}", self.rpc.server_url());
        Ok(handle)
    }

    /// Stops and joins the worker, then closes the connection.
    pub fn shutdown(&self, handle: SchedulerHandle) {
        handle.shutdown();
        self.rpc.disconnect();
        tracing::info!("[ExternalData] shut down");
    }
}
