pub mod base;
pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod websocket;

pub use base::{Connector, ExchangeCfg, REPLY_MARKER, WsConn, exchange};
pub use http::http_post_json;
pub use websocket::{TungsteniteConnector, TungsteniteConn};
