//! # Synheart Core
//!
//! Foundation crate for the Synheart mock sensor engine. Synheart generates
//! HSI-compatible sensor streams (heart rate, respiration, motion, ...) that
//! mimic phone + wearable sources, so SDKs can be developed and demoed
//! without physical devices.
//!
//! This crate carries the pieces shared by the engine and its surrounding
//! transports:
//!
//! - **Types**: the [`Event`] emitted for every generated sample
//! - **Units**: human-friendly duration ([`Span`]) and sampling-rate
//!   ([`SignalRate`]) values used throughout scenario definitions
//! - **Timing**: the [`TickClock`] abstraction with wall-clock and virtual
//!   (test) implementations
//! - **Configuration**: [`EngineConfig`] with the standard search path
//! - **Observability**: structured logging setup via the `tracing` ecosystem
//!
//! The scenario engine itself lives in the `synheart-sim` crate.

pub mod config;
pub mod observe;
pub mod timing;
pub mod types;
pub mod units;

pub use config::{ConfigError, EngineConfig, StreamConfig};
pub use observe::{init_logging, LogConfig, LogFormat, LogLevel};
pub use timing::{TickClock, VirtualClock, WallTickClock};
pub use types::Event;
pub use units::{SignalRate, Span};
