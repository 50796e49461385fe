use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tungstenite::{Message as WsMsg, WebSocket, connect, stream::MaybeTlsStream};
use url::Url;

use super::base::{Connector, WsConn};
use crate::config::RpcConfig;
use crate::error::TransportError;

/// Blocking tungstenite client. Reads and writes time out after `io_timeout`, which turns an
/// idle socket into `Retryable` instead of parking the worker forever.
#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    io_timeout: Option<Duration>,
}

impl TungsteniteConnector {
    pub fn new(io_timeout: Option<Duration>) -> Self {
        Self {
            io_timeout: io_timeout.filter(|d| !d.is_zero()),
        }
    }

    pub fn from_config(cfg: &RpcConfig) -> Self {
        Self::new(Some(Duration::from_millis(cfg.io_timeout_ms)))
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::from_config(&RpcConfig::default())
    }
}

impl Connector for TungsteniteConnector {
    type Conn = TungsteniteConn;

    fn connect(&self, url: &str) -> Result<Self::Conn, TransportError> {
        let parsed = Url::parse(url)
            .with_context(|| format!("invalid websocket endpoint: {url}"))
            .map_err(TransportError::Connect)?;
        // Built without a TLS backend.
        if parsed.scheme() != "ws" {
            return Err(TransportError::Connect(anyhow!(
                "unsupported websocket scheme: {} (only ws:// is available)",
                parsed.scheme()
            )));
        }

        tracing::debug!("[WsTransport] connecting to {}", parsed);
        let (ws, _resp) = connect(parsed.as_str())
            .map_err(|e| TransportError::Connect(anyhow::Error::new(e)))?;

        if let MaybeTlsStream::Plain(stream) = ws.get_ref() {
            configure_stream(stream, self.io_timeout).map_err(TransportError::Connect)?;
        }

        Ok(TungsteniteConn {
            ws,
            open: true,
            unflushed: false,
        })
    }
}

fn configure_stream(stream: &TcpStream, timeout: Option<Duration>) -> anyhow::Result<()> {
    stream.set_nodelay(true).context("set_nodelay")?;
    stream.set_read_timeout(timeout).context("set_read_timeout")?;
    stream.set_write_timeout(timeout).context("set_write_timeout")?;
    Ok(())
}

pub struct TungsteniteConn {
    ws: WebSocket<MaybeTlsStream<TcpStream>>,
    open: bool,
    /// A frame is queued in tungstenite's write buffer but not yet flushed.
    unflushed: bool,
}

impl TungsteniteConn {
    fn map_err(&mut self, err: tungstenite::Error) -> TransportError {
        match err {
            tungstenite::Error::Io(ref e)
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                TransportError::Retryable
            }
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                self.open = false;
                TransportError::Closed
            }
            other => {
                self.open = false;
                TransportError::Io(anyhow::Error::new(other))
            }
        }
    }
}

impl WsConn for TungsteniteConn {
    fn send_text(&mut self, payload: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        // A retried send only flushes; re-queueing would duplicate the frame.
        let res = if self.unflushed {
            self.ws.flush()
        } else {
            self.ws.send(WsMsg::Text(payload.to_owned()))
        };
        match res {
            Ok(()) => {
                self.unflushed = false;
                Ok(())
            }
            Err(e) => {
                let err = self.map_err(e);
                self.unflushed = err.is_retryable();
                Err(err)
            }
        }
    }

    fn recv_text(&mut self, max_len: usize) -> Result<String, TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        match self.ws.read() {
            Ok(WsMsg::Text(s)) if s.len() > max_len => Err(TransportError::Oversized(s.len())),
            Ok(WsMsg::Text(s)) => Ok(s),
            Ok(WsMsg::Close(frame)) => {
                tracing::info!("[WsTransport] server closed the connection: {:?}", frame);
                self.open = false;
                Err(TransportError::Closed)
            }
            // Ping replies are queued by tungstenite itself; binary frames are not ours.
            Ok(_) => Ok(String::new()),
            Err(e) => Err(self.map_err(e)),
        }
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let _ = self.ws.close(None);
        let _ = self.ws.flush();
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for TungsteniteConn {
    fn drop(&mut self) {
        self.close();
    }
}
