//! Observability utilities.
//!
//! The engine itself only emits `tracing` events; wiring those events to an
//! output belongs to the binary that embeds it. [`init_logging`] is the
//! standard way to do that wiring.

mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
