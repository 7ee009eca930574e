//! Error types

mod api;
mod provider;
mod storage;
mod throttle;

pub use api::*;
pub use provider::*;
pub use storage::*;
pub use throttle::*;
