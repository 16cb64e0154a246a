//! # Synheart Scenario Engine
//!
//! Scenario-driven generation of mock phone/wearable sensor streams. A
//! scenario declares signals (baseline, noise, rate, unit) and phases that
//! reshape them over time; the engine turns one scenario into any number of
//! independent, reproducible sample streams.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   ScenarioRegistry                       │
//! │        (load YAML dir + builtins, validate, index)       │
//! └──────────────────────┬───────────────────────────────────┘
//!                        │ Arc<Scenario>
//!                        ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                  GenerationSession                       │
//! │   PhaseSchedule ──► EffectiveSignal ──► SignalSampler    │
//! │   (which overrides    (resolved config)   (seeded draw)  │
//! │    are in effect)                                        │
//! └──────────────────────┬───────────────────────────────────┘
//!                        │ tick(elapsed) -> Vec<Event>
//!                        ▼
//!              SessionStream (one thread per session)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use synheart_sim::{GenerationSession, ScenarioRegistry, SessionOptions};
//!
//! let registry = ScenarioRegistry::with_builtins().unwrap();
//! let scenario = registry.get("resting").unwrap();
//!
//! let mut session =
//!     GenerationSession::new(scenario, &SessionOptions::with_seed(42)).unwrap();
//! let events = session.tick(Duration::from_secs(2)).unwrap();
//! assert!(!events.is_empty());
//! ```
//!
//! Determinism: two sessions built from the same scenario with the same
//! explicit seed produce identical event sequences. Sessions without an
//! explicit seed draw a fresh one at construction.

pub mod error;
pub mod runner;
pub mod scenario;
pub mod session;

pub use error::{EngineError, EngineResult};
pub use runner::{CancelToken, SessionMessage, SessionStream};
pub use scenario::{
    Baseline, EffectiveSignal, NoiseConfig, NoiseKind, NoiseShape, Override, Phase, PhaseSchedule,
    Scenario, ScenarioRegistry, SignalConfig, SignalSampler,
};
pub use session::{GenerationSession, SessionOptions, SessionState};
pub use synheart_core::Event;
