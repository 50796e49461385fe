use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};

use super::NULL_SENTINEL;
use super::envelope::{
    IdAllocator, METHOD_READ_VARIABLE, METHOD_WRITE_VARIABLE, ReadVariableReply, RpcRequest,
    write_succeeded,
};
use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::transport::{Connector, ExchangeCfg, WsConn, exchange};
use crate::utils::HealthFlag;
use crate::utils::lock_rank::{self, LockRank};
use crate::utils::logger::Throttle;
use crate::warn_throttled;

/// Receives the client's view of server health. Implemented by the GUI side to drive the
/// prompt banner.
pub trait StatusSink: Send + Sync {
    /// Called on every failed read once the consecutive-failure threshold is reached.
    fn on_sustained_failure(&self, msg: &str);
    /// Called on every successful read.
    fn on_recovered(&self);
}

struct RpcState<Conn> {
    conn: Option<Conn>,
    ids: IdAllocator,
}

/// JSON-RPC client multiplexing every call over one lazily (re)built WebSocket.
///
/// The state mutex is held for a whole request/response round trip, so callers on different
/// threads never interleave frames on the socket.
pub struct RpcClient<C: Connector> {
    connector: C,
    server_url: String,
    cfg: RpcConfig,
    state: Mutex<RpcState<C::Conn>>,
    failures: AtomicU32,
    connected: HealthFlag,
    sink: Option<Arc<dyn StatusSink>>,
    read_throttle: Throttle,
}

impl<C: Connector> RpcClient<C> {
    pub fn new(server_url: impl Into<String>, cfg: RpcConfig, connector: C) -> Self {
        Self {
            connector,
            server_url: server_url.into(),
            cfg,
            state: Mutex::new(RpcState {
                conn: None,
                ids: IdAllocator::default(),
            }),
            failures: AtomicU32::new(0),
            connected: HealthFlag::new(false),
            sink: None,
            read_throttle: Throttle::new(Duration::from_secs(5)),
        }
    }

    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// Consecutive failed reads since the last success.
    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }

    fn exchange_cfg(&self) -> ExchangeCfg {
        ExchangeCfg {
            send_retry: self.cfg.send_retry,
            recv_retry: self.cfg.recv_retry,
            max_frame: self.cfg.recv_buffer_bytes,
        }
    }

    /// Opens the socket now instead of on the first call.
    pub fn connect(&self) -> Result<(), RpcError> {
        let _rank = lock_rank::blocking(LockRank::Rpc);
        let mut state = self.state.lock();
        self.ensure_connection(&mut state)
    }

    /// Closes the socket. The next call reconnects.
    pub fn disconnect(&self) {
        let _rank = lock_rank::blocking(LockRank::Rpc);
        let mut state = self.state.lock();
        if let Some(mut conn) = state.conn.take() {
            conn.close();
            tracing::info!("[RpcClient] disconnected from {}", self.server_url);
        }
        self.connected.down();
    }

    fn ensure_connection(&self, state: &mut RpcState<C::Conn>) -> Result<(), RpcError> {
        if state.conn.as_ref().is_some_and(|c| c.is_open()) {
            return Ok(());
        }
        if let Some(mut stale) = state.conn.take() {
            stale.close();
        }
        self.connected.down();

        let conn = self.cfg.connect_retry.run(|attempt| {
            match self.connector.connect(&self.server_url) {
                Ok(conn) => Some(conn),
                Err(e) => {
                    tracing::warn!(
                        "[RpcClient] connect attempt {} to {} failed: {}",
                        attempt + 1,
                        self.server_url,
                        e
                    );
                    None
                }
            }
        });

        match conn {
            Some(conn) => {
                state.conn = Some(conn);
                self.connected.up();
                tracing::info!("[RpcClient] connected to {}", self.server_url);
                Ok(())
            }
            None => {
                tracing::error!(
                    "[RpcClient] failed to establish websocket connection to {}",
                    self.server_url
                );
                Err(RpcError::NotConnected)
            }
        }
    }

    /// Performs one JSON-RPC call and returns the whole decoded response object.
    ///
    /// A transport failure closes the socket, reconnects and resends the same request; at
    /// most `request_attempts` round trips are made.
    pub fn try_call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let _rank = lock_rank::blocking(LockRank::Rpc);
        let mut state = self.state.lock();
        self.ensure_connection(&mut state)?;

        let id = state.ids.next_id();
        let payload = RpcRequest::new(id, method, &params).encode()?;
        tracing::trace!("[RpcClient] sending request: {}", payload);

        let cfg = self.exchange_cfg();
        let attempts = self.cfg.request_attempts.max(1);
        let mut reply = None;
        let mut last_err = RpcError::NoReply;

        for attempt in 0..attempts {
            let Some(conn) = state.conn.as_mut() else {
                break;
            };
            match exchange(conn, &payload, &cfg) {
                Ok(text) => {
                    reply = Some(text);
                    break;
                }
                Err(e) => {
                    last_err = RpcError::Transport(e);
                    if let Some(mut conn) = state.conn.take() {
                        conn.close();
                    }
                    self.connected.down();
                    if attempt + 1 < attempts {
                        tracing::warn!(
                            "[RpcClient] {} call failed ({}), attempting to reconnect",
                            method,
                            last_err
                        );
                        if let Err(e) = self.ensure_connection(&mut state) {
                            last_err = e;
                            break;
                        }
                    }
                }
            }
        }
        drop(state);

        let Some(text) = reply else {
            tracing::warn!("[RpcClient] no data returned from jsonrpc server after retries");
            return Err(last_err);
        };
        tracing::trace!("[RpcClient] decoding json: {}", text);
        serde_json::from_str(&text).map_err(|e| RpcError::Decode(e.to_string()))
    }

    /// [`try_call`](Self::try_call) with the error logged and dropped.
    pub fn call(&self, method: &str, params: Value) -> Option<Value> {
        match self.try_call(method, params) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("[RpcClient] {} failed: {}", method, e);
                None
            }
        }
    }

    /// Reads each variable in order; a failed read yields `"NULL"` in its slot.
    pub fn read_variables<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names.iter().map(|n| self.read_one(n.as_ref())).collect()
    }

    fn read_one(&self, name: &str) -> String {
        let outcome = self
            .try_call(METHOD_READ_VARIABLE, json!([name]))
            .and_then(ReadVariableReply::formatted_value);
        match outcome {
            Ok(value) => {
                self.note_success();
                value
            }
            Err(e) => {
                self.note_failure(name, &e);
                NULL_SENTINEL.to_string()
            }
        }
    }

    fn note_success(&self) {
        let prev = self.failures.swap(0, Ordering::AcqRel);
        if prev > 0 {
            tracing::info!("[RpcClient] reads recovered after {} failures", prev);
        }
        if let Some(sink) = &self.sink {
            sink.on_recovered();
        }
    }

    fn note_failure(&self, name: &str, err: &RpcError) {
        let count = self.failures.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        warn_throttled!(
            self.read_throttle,
            "[RpcClient] read of {} failed ({} in a row): {}",
            name,
            count,
            err
        );
        if count >= self.cfg.failure_threshold
            && let Some(sink) = &self.sink
        {
            sink.on_sustained_failure(&err.user_message());
        }
    }

    /// Fire-and-forget write; the outcome is only logged.
    pub fn write_variable(&self, name: &str, value: i64) {
        match self.try_call(METHOD_WRITE_VARIABLE, json!([name, value])) {
            Ok(reply) => match write_succeeded(&reply) {
                Some(true) => tracing::debug!("[RpcClient] wrote {} = {}", name, value),
                _ => tracing::warn!("[RpcClient] write of {} = {} rejected: {}", name, value, reply),
            },
            Err(e) => tracing::error!("[RpcClient] write of {} = {} failed: {}", name, value, e),
        }
    }

    #[cfg(test)]
    pub(crate) fn preload_id(&self, next: u32) {
        self.state.lock().ids.preload(next);
    }
}

impl<C: Connector> Drop for RpcClient<C> {
    fn drop(&mut self) {
        if let Some(mut conn) = self.state.get_mut().conn.take() {
            conn.close();
        }
    }
}
