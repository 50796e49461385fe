use crate::error::TransportError;
use crate::utils::backoff::RetryCfg;

/// Substring every JSON-RPC reply frame carries; cheap sanity check before parsing.
pub const REPLY_MARKER: &str = "jsonrpc";

/// One live text-frame connection.
pub trait WsConn: Send {
    /// Sends one text frame. `Retryable` means nothing was lost and the call may be repeated.
    fn send_text(&mut self, payload: &str) -> Result<(), TransportError>;

    /// Reads one text frame of at most `max_len` bytes.
    ///
    /// Returns `Retryable` when no frame is available yet. Control frames and non-text
    /// payloads come back as an empty string.
    fn recv_text(&mut self, max_len: usize) -> Result<String, TransportError>;

    /// Sends an empty close frame and releases the socket. Idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Opens connections to the JSON-RPC server.
pub trait Connector: Send + Sync + 'static {
    type Conn: WsConn + 'static;

    fn connect(&self, url: &str) -> Result<Self::Conn, TransportError>;
}

/// Limits for one request/response exchange.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeCfg {
    pub send_retry: RetryCfg,
    pub recv_retry: RetryCfg,
    pub max_frame: usize,
}

/// Sends `payload` and waits for the first frame that looks like a JSON-RPC reply.
///
/// Failures are reported but the connection is left as is; closing and reconnecting is the
/// caller's decision.
pub fn exchange<C: WsConn + ?Sized>(
    conn: &mut C,
    payload: &str,
    cfg: &ExchangeCfg,
) -> Result<String, TransportError> {
    send_with_retry(conn, payload, &cfg.send_retry)?;
    recv_reply(conn, &cfg.recv_retry, cfg.max_frame)
}

fn send_with_retry<C: WsConn + ?Sized>(
    conn: &mut C,
    payload: &str,
    retry: &RetryCfg,
) -> Result<(), TransportError> {
    let mut attempt = 0;
    loop {
        match conn.send_text(payload) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() => {
                attempt += 1;
                if attempt >= retry.attempts {
                    tracing::warn!("[WsTransport] send still blocked after {attempt} attempts");
                    return Err(e);
                }
                retry.pause();
            }
            Err(e) => {
                tracing::warn!("[WsTransport] failed to send websocket message: {e}");
                return Err(e);
            }
        }
    }
}

fn recv_reply<C: WsConn + ?Sized>(
    conn: &mut C,
    retry: &RetryCfg,
    max_frame: usize,
) -> Result<String, TransportError> {
    for _ in 0..retry.attempts {
        match conn.recv_text(max_frame) {
            Ok(frame) if !frame.is_empty() && frame.contains(REPLY_MARKER) => return Ok(frame),
            // Unrelated frame: counts as an attempt but needs no pause.
            Ok(_) => {}
            Err(e) if e.is_retryable() => retry.pause(),
            Err(e) => {
                tracing::warn!("[WsTransport] failed to receive websocket message: {e}");
                return Err(e);
            }
        }
    }
    tracing::warn!(
        "[WsTransport] websocket receive timeout after {} retries",
        retry.attempts
    );
    Err(TransportError::Timeout(retry.attempts))
}
