//! Request serialization and spacing.

mod config;
mod queue;

pub use config::ThrottleConfig;
pub use queue::RequestThrottle;
