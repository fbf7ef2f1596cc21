//! Handlers 模块

pub mod metrics;
pub mod session;
pub mod telemetry;

pub use metrics::*;
pub use session::*;
pub use telemetry::*;
