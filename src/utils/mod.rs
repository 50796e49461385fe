pub use cancel_token::*;
pub use core_pinner::*;
pub use health_flag::*;

pub mod backoff;
mod cancel_token;
pub mod config_io;
mod core_pinner;
mod health_flag;
pub mod lock_rank;
pub mod logger;
pub mod time;
