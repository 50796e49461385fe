use std::{error::Error, fmt};

const ERR_MSG_RETRYABLE: &str = "transport busy, try again";
const ERR_MSG_CLOSED: &str = "connection closed";
const ERR_MSG_NOT_CONNECTED: &str = "no websocket connection";
const ERR_MSG_NO_REPLY: &str = "no data returned from jsonrpc server after retries";

/// Failure of a single transport primitive (connect, send, recv).
#[derive(Debug)]
pub enum TransportError {
    /// "Would block / try again"; the caller may retry the same frame.
    Retryable,
    /// Peer closed the socket or the handle was already closed.
    Closed,
    /// No frame carrying a JSON-RPC reply arrived within the given number of attempts.
    Timeout(u32),
    Connect(anyhow::Error),
    Io(anyhow::Error),
    /// Incoming frame larger than the receive buffer.
    Oversized(usize),
}

impl TransportError {
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Retryable)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Retryable => write!(f, "{ERR_MSG_RETRYABLE}"),
            TransportError::Closed => write!(f, "{ERR_MSG_CLOSED}"),
            TransportError::Timeout(n) => write!(f, "websocket receive timeout after {n} retries"),
            TransportError::Connect(err) => write!(f, "websocket connect failed: {err}"),
            TransportError::Io(err) => write!(f, "websocket io error: {err}"),
            TransportError::Oversized(len) => {
                write!(f, "frame of {len} bytes exceeds the receive buffer")
            }
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportError::Connect(err) | TransportError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Failure of one JSON-RPC call. Always per-call: the connection is repaired lazily.
#[derive(Debug)]
pub enum RpcError {
    NotConnected,
    Transport(TransportError),
    NoReply,
    Encode(String),
    /// Reply was not valid JSON or did not match the expected schema.
    Decode(String),
    /// Server answered with `success: false`.
    Server { code: i64, msg: String },
}

impl RpcError {
    /// Text shown to the user when failures persist.
    pub fn user_message(&self) -> String {
        match self {
            RpcError::Server { msg, .. } => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::NotConnected => write!(f, "{ERR_MSG_NOT_CONNECTED}"),
            RpcError::Transport(err) => write!(f, "{err}"),
            RpcError::NoReply => write!(f, "{ERR_MSG_NO_REPLY}"),
            RpcError::Encode(msg) => write!(f, "failed to encode request: {msg}"),
            RpcError::Decode(msg) => write!(f, "failed to decode json: {msg}"),
            RpcError::Server { code, msg } => write!(f, "server error {code}: {msg}"),
        }
    }
}

impl Error for RpcError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RpcError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for RpcError {
    fn from(err: TransportError) -> Self {
        RpcError::Transport(err)
    }
}

/// Invalid widget binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    NoVariables,
    /// Multi-series widgets need exactly one child handle per variable.
    ChildCountMismatch {
        kind: &'static str,
        variables: usize,
        children: usize,
    },
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingError::NoVariables => write!(f, "binding has no variables"),
            BindingError::ChildCountMismatch {
                kind,
                variables,
                children,
            } => write!(
                f,
                "{kind} binding has {variables} variables but {children} child handles"
            ),
        }
    }
}

impl Error for BindingError {}
