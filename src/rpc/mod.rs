mod client;
pub mod envelope;

pub use client::{RpcClient, StatusSink};

/// Placeholder for a variable that could not be read this cycle.
pub const NULL_SENTINEL: &str = "NULL";
