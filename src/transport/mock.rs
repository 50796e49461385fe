//! Scripted in-memory JSON-RPC server for tests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};

use super::base::{Connector, WsConn};
use crate::error::TransportError;

/// What the fake server does with one request.
pub(crate) enum Reply {
    Frame(String),
    /// Drop the socket after the request was sent.
    Hangup,
    /// Never answer; the client runs out of receive attempts.
    Silence,
}

type Handler = Box<dyn FnMut(&Value) -> Reply + Send>;

pub(crate) struct MockServer {
    handler: Handler,
    /// Connect attempts to refuse before accepting again; `usize::MAX` refuses forever.
    pub refuse_connects: usize,
    pub connects: usize,
    pub closes: usize,
    pub requests: Vec<Value>,
}

#[derive(Clone)]
pub(crate) struct MockConnector {
    server: Arc<Mutex<MockServer>>,
}

impl MockConnector {
    pub fn new(handler: impl FnMut(&Value) -> Reply + Send + 'static) -> Self {
        Self {
            server: Arc::new(Mutex::new(MockServer {
                handler: Box::new(handler),
                refuse_connects: 0,
                connects: 0,
                closes: 0,
                requests: Vec::new(),
            })),
        }
    }

    /// Answers every `ReadVariable` with `formatted`, keyed by variable name.
    pub fn formatted(lookup: impl Fn(&str) -> Option<String> + Send + 'static) -> Self {
        Self::new(move |req| {
            let id = req["id"].as_u64().unwrap_or(0);
            let name = req["params"][0].as_str().unwrap_or_default();
            match lookup(name) {
                Some(v) => Reply::Frame(read_ok(id, &v)),
                None => Reply::Frame(read_err(id, 2, &format!("unknown variable {name}"))),
            }
        })
    }

    pub fn set_handler(&self, handler: impl FnMut(&Value) -> Reply + Send + 'static) {
        self.server.lock().handler = Box::new(handler);
    }

    pub fn refuse_connects(&self, n: usize) {
        self.server.lock().refuse_connects = n;
    }

    pub fn connects(&self) -> usize {
        self.server.lock().connects
    }

    pub fn closes(&self) -> usize {
        self.server.lock().closes
    }

    pub fn requests(&self) -> Vec<Value> {
        self.server.lock().requests.clone()
    }
}

impl Connector for MockConnector {
    type Conn = MockConn;

    fn connect(&self, _url: &str) -> Result<Self::Conn, TransportError> {
        let mut server = self.server.lock();
        if server.refuse_connects > 0 {
            if server.refuse_connects != usize::MAX {
                server.refuse_connects -= 1;
            }
            return Err(TransportError::Connect(anyhow::anyhow!("connection refused")));
        }
        server.connects += 1;
        Ok(MockConn {
            server: self.server.clone(),
            inbox: VecDeque::new(),
            open: true,
            hung_up: false,
        })
    }
}

pub(crate) struct MockConn {
    server: Arc<Mutex<MockServer>>,
    inbox: VecDeque<String>,
    open: bool,
    hung_up: bool,
}

impl WsConn for MockConn {
    fn send_text(&mut self, payload: &str) -> Result<(), TransportError> {
        if !self.open || self.hung_up {
            return Err(TransportError::Closed);
        }
        let req: Value = serde_json::from_str(payload)
            .map_err(|e| TransportError::Io(anyhow::anyhow!("mock got invalid json: {e}")))?;
        let mut server = self.server.lock();
        server.requests.push(req.clone());
        match (server.handler)(&req) {
            Reply::Frame(frame) => self.inbox.push_back(frame),
            Reply::Hangup => self.hung_up = true,
            Reply::Silence => {}
        }
        Ok(())
    }

    fn recv_text(&mut self, max_len: usize) -> Result<String, TransportError> {
        if let Some(frame) = self.inbox.pop_front() {
            if frame.len() > max_len {
                return Err(TransportError::Oversized(frame.len()));
            }
            return Ok(frame);
        }
        if self.hung_up || !self.open {
            return Err(TransportError::Closed);
        }
        Err(TransportError::Retryable)
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.server.lock().closes += 1;
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

pub(crate) fn read_ok(id: u64, formatted: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id.to_string(),
        "result": {
            "success": true,
            "data": formatted.parse::<f64>().unwrap_or(0.0),
            "xtra": { "retval": true, "formatted": formatted }
        }
    })
    .to_string()
}

pub(crate) fn read_err(id: u64, code: i64, msg: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id.to_string(),
        "result": {
            "success": false,
            "xtra": { "retval": false },
            "error": { "code": code, "msg": msg }
        }
    })
    .to_string()
}
