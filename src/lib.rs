pub mod config;
pub mod edata;
pub mod error;
pub mod rpc;
pub mod scheduler;
pub mod transport;
pub mod utils;
pub mod widgets;

pub use edata::ExternalData;
