use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

pub const METHOD_READ_VARIABLE: &str = "ReadVariable";
pub const METHOD_WRITE_VARIABLE: &str = "WriteVariable";

/// Outgoing JSON-RPC 2.0 request, serialised compactly.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u32,
    pub method: &'a str,
    pub params: &'a Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u32, method: &'a str, params: &'a Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }

    pub fn encode(&self) -> Result<String, RpcError> {
        serde_json::to_string(self).map_err(|e| RpcError::Encode(e.to_string()))
    }
}

/// Request ids: monotonically increasing, never 0, wrapping from `u32::MAX` back to 1.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Sets the value the next call would hand out (normalised by the wrap rule).
    pub fn preload(&mut self, next: u32) {
        self.next = next;
    }

    pub fn next_id(&mut self) -> u32 {
        if self.next == 0 || self.next == u32::MAX {
            self.next = 1;
        }
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Reply to `ReadVariable`. Unknown fields are ignored; the listed ones must type-check.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadVariableReply {
    pub id: String,
    pub result: ReadResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadResult {
    pub success: bool,
    #[serde(default)]
    pub data: Option<f64>,
    pub xtra: ReadExtra,
    #[serde(default)]
    pub error: Option<ServerError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadExtra {
    pub retval: bool,
    #[serde(default)]
    pub formatted: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerError {
    pub code: i64,
    pub msg: String,
}

impl ReadVariableReply {
    /// Strictly unpacks a raw reply and returns the formatted value.
    pub fn formatted_value(reply: Value) -> Result<String, RpcError> {
        let parsed: ReadVariableReply =
            serde_json::from_value(reply).map_err(|e| RpcError::Decode(e.to_string()))?;
        let result = parsed.result;
        if !result.success {
            return Err(match result.error {
                Some(err) => RpcError::Server {
                    code: err.code,
                    msg: err.msg,
                },
                None => RpcError::Server {
                    code: 0,
                    msg: "read failed without an error message".into(),
                },
            });
        }
        result
            .xtra
            .formatted
            .ok_or_else(|| RpcError::Decode("reply carries no formatted value".into()))
    }
}

/// `result.success` of a `WriteVariable` reply, if present.
pub fn write_succeeded(reply: &Value) -> Option<bool> {
    reply.get("result")?.get("success")?.as_bool()
}
