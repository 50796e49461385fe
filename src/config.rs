use serde::{Deserialize, Serialize};

use crate::utils::backoff::RetryCfg;
use crate::utils::config_io::load_cfg;

/// Receive buffer size for one WebSocket frame and for HTTP bodies.
pub const RECV_BUFFER_BYTES: usize = 128 * 1024;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdataConfig {
    /// WebSocket endpoint of the FreeMASTER JSON-RPC server, e.g. `ws://localhost:8090`.
    pub server_url: String,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

impl EdataConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            scheduler: SchedulerConfig::default(),
            rpc: RpcConfig::default(),
            cache: CacheConfig::default(),
            prompt: PromptConfig::default(),
        }
    }

    pub fn load(path: impl AsRef<str>) -> anyhow::Result<Self> {
        load_cfg(path)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Sleep after a pass that fired at least one task.
    pub busy_sleep_ms: u64,
    /// Sleep after a pass with nothing due.
    pub idle_sleep_ms: u64,
    /// Minimum spacing between cache drains issued by the worker.
    pub drain_interval_ms: u64,
    /// In-flight callback gate.
    pub max_in_flight: usize,
    pub core_id: Option<usize>,
    /// Stop the worker on SIGTERM/SIGINT.
    pub handle_term_signals: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            busy_sleep_ms: 1,
            idle_sleep_ms: 10,
            drain_interval_ms: 100,
            max_in_flight: 3,
            core_id: None,
            handle_term_signals: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    pub connect_retry: RetryCfg,
    pub send_retry: RetryCfg,
    pub recv_retry: RetryCfg,
    /// Whole request attempts per call; a reconnect happens between them.
    pub request_attempts: u32,
    /// Consecutive failed reads before the prompt banner is shown.
    pub failure_threshold: u32,
    pub recv_buffer_bytes: usize,
    /// Socket read/write timeout; one expiry counts as one retryable receive.
    pub io_timeout_ms: u64,
    pub http_timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            connect_retry: RetryCfg::new(3, 100),
            send_retry: RetryCfg::new(3, 25),
            recv_retry: RetryCfg::new(40, 25),
            request_attempts: 2,
            failure_threshold: 5,
            recv_buffer_bytes: RECV_BUFFER_BYTES,
            io_timeout_ms: 25,
            http_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub stale_after_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 32,
            stale_after_ms: 5_000,
        }
    }
}

/// Look of the error banner shown on sustained RPC failure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptConfig {
    pub height_px: u32,
    /// 0xRRGGBB
    pub text_color: u32,
    pub border_width: u32,
    pub radius: u32,
    pub font: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            height_px: 30,
            text_color: 0xff0027,
            border_width: 1,
            radius: 3,
            font: None,
        }
    }
}
